//! Stemma - WASM Module
//!
//! This module provides the family-tree layout engine for the Stemma
//! succession planning UI. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `tree`: arena-backed family tree (person and union nodes, string ids)
//! - `layout`: tidy tree layout and the fan chart projection
//! - `spatial`: R-tree spatial indexing for O(log n) hit testing
//! - `error`: the layout error taxonomy
//!
//! The web UI owns the family records, the persistence layer, and all
//! rendering; this module only turns a tree shape into coordinates and
//! answers pointer queries against them.

use js_sys::Float32Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod layout;
pub mod spatial;
pub mod tree;

use layout::{FanConfig, TidyConfig, TidyLayout, TreeLayout};
use spatial::SpatialIndex;
use tree::{FamilyTree, NodeIdx, NodeKind};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Main entry point for the layout engine.
///
/// Wraps the family tree arena, the most recent layout, and the spatial
/// index, and provides the public API exposed to JavaScript.
#[wasm_bindgen]
pub struct StemmaWasm {
    tree: FamilyTree,
    layout: Option<TreeLayout>,
    spatial: SpatialIndex,
}

#[wasm_bindgen]
impl StemmaWasm {
    /// Create a new empty engine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            tree: FamilyTree::new(),
            layout: None,
            spatial: SpatialIndex::new(),
        }
    }

    /// Create an engine with pre-allocated node capacity.
    #[wasm_bindgen(js_name = withCapacity)]
    pub fn with_capacity(node_capacity: usize) -> Self {
        Self {
            tree: FamilyTree::with_capacity(node_capacity),
            layout: None,
            spatial: SpatialIndex::new(),
        }
    }

    // =========================================================================
    // Tree Building
    // =========================================================================

    /// Add a person node.
    ///
    /// Returns the assigned slot, or undefined if the id is already taken.
    #[wasm_bindgen(js_name = addPerson)]
    pub fn add_person(&mut self, id: String) -> Option<u32> {
        self.invalidate();
        self.tree.add_person(id).map(|idx| idx.raw())
    }

    /// Add a union (marriage) node.
    ///
    /// Returns the assigned slot, or undefined if the id is already taken.
    #[wasm_bindgen(js_name = addUnion)]
    pub fn add_union(&mut self, id: String) -> Option<u32> {
        self.invalidate();
        self.tree.add_union(id).map(|idx| idx.raw())
    }

    /// Append `child` to `parent`'s ordered children.
    ///
    /// Returns true on success. Malformed wiring (a child attached twice, a
    /// cycle) is accepted here and reported by `computeLayout`.
    #[wasm_bindgen(js_name = attachChild)]
    pub fn attach_child(&mut self, parent: u32, child: u32) -> bool {
        self.invalidate();
        self.tree.attach(NodeIdx::new(parent), NodeIdx::new(child))
    }

    /// Bulk-add nodes from a JS array of id strings.
    ///
    /// `kinds` is an optional parallel array (0 = person, 1 = union);
    /// omitted entries default to person. Returns the number of nodes
    /// added; duplicate ids are skipped.
    #[wasm_bindgen(js_name = loadNodes)]
    pub fn load_nodes(&mut self, ids: JsValue, kinds: Option<Vec<u8>>) -> Result<u32, JsError> {
        let ids: Vec<String> = serde_wasm_bindgen::from_value(ids)
            .map_err(|e| JsError::new(&format!("invalid id array: {e}")))?;
        self.invalidate();

        let kinds = kinds.unwrap_or_default();
        let mut added = 0;
        for (i, id) in ids.into_iter().enumerate() {
            let kind = NodeKind::from(kinds.get(i).copied().unwrap_or(0));
            if self.tree.add_node(id, kind).is_some() {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Bulk-attach edges from a flat array of [parent0, child0, ...] pairs.
    ///
    /// Returns the number of edges attached; pairs with out-of-range slots
    /// are skipped. A trailing unpaired element is ignored.
    #[wasm_bindgen(js_name = attachPairs)]
    pub fn attach_pairs(&mut self, edges: &[u32]) -> u32 {
        self.invalidate();
        let mut attached = 0;
        for pair in edges.chunks_exact(2) {
            if self.tree.attach(NodeIdx::new(pair[0]), NodeIdx::new(pair[1])) {
                attached += 1;
            }
        }
        attached
    }

    /// Get the number of nodes.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.tree.len() as u32
    }

    /// Get a node's kind (0 = person, 1 = union).
    #[wasm_bindgen(js_name = nodeKind)]
    pub fn node_kind(&self, slot: u32) -> Option<u8> {
        self.tree.kind(NodeIdx::new(slot)).map(|k| k as u8)
    }

    /// Get a node's id.
    #[wasm_bindgen(js_name = idOf)]
    pub fn id_of(&self, slot: u32) -> Option<String> {
        self.tree.id_of(NodeIdx::new(slot)).map(str::to_owned)
    }

    /// Get the slot for an id.
    #[wasm_bindgen(js_name = slotOf)]
    pub fn slot_of(&self, id: &str) -> Option<u32> {
        self.tree.slot_of(id).map(|idx| idx.raw())
    }

    /// Remove all nodes and drop any computed layout.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.invalidate();
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Compute the tidy layout of the tree rooted at `root`.
    ///
    /// Both spacing parameters must be strictly positive. Throws on invalid
    /// parameters or a malformed tree; on failure no layout is retained.
    #[wasm_bindgen(js_name = computeLayout)]
    pub fn compute_layout(
        &mut self,
        root: u32,
        min_separation: f32,
        level_gap: f32,
    ) -> Result<(), JsError> {
        self.compute_with_config(
            root,
            TidyConfig {
                min_separation,
                level_gap,
            },
        )
    }

    /// Compute the tidy layout from a JS options object
    /// `{ minSeparation?, levelGap? }`; missing fields use the defaults.
    #[wasm_bindgen(js_name = computeLayoutWithOptions)]
    pub fn compute_layout_with_options(
        &mut self,
        root: u32,
        options: JsValue,
    ) -> Result<(), JsError> {
        let config = if options.is_undefined() || options.is_null() {
            TidyConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsError::new(&format!("invalid layout options: {e}")))?
        };
        self.compute_with_config(root, config)
    }

    /// Whether a layout is currently available.
    #[wasm_bindgen(js_name = hasLayout)]
    pub fn has_layout(&self) -> bool {
        self.layout.is_some()
    }

    /// Project the current tidy layout into fan chart coordinates.
    ///
    /// Takes a JS options object `{ sweepRadians?, ringGap? }` and returns
    /// interleaved [x0, y0, x1, y1, ...] fan positions without replacing
    /// the stored tidy layout. Throws if no layout has been computed.
    #[wasm_bindgen(js_name = projectFan)]
    pub fn project_fan(&self, root: u32, options: JsValue) -> Result<Float32Array, JsError> {
        let tidy = self.require_layout()?;
        let config = if options.is_undefined() || options.is_null() {
            FanConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsError::new(&format!("invalid fan options: {e}")))?
        };
        let fan = layout::project_fan(&self.tree, NodeIdx::new(root), tidy, &config)?;
        Ok(interleave(&fan))
    }

    // =========================================================================
    // Position Access
    // =========================================================================

    /// Get a zero-copy view of X positions in slot order.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for rendering upload, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Option<Float32Array> {
        self.layout
            .as_ref()
            .map(|layout| unsafe { Float32Array::view(layout.positions_x()) })
    }

    /// Get a zero-copy view of Y positions in slot order.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for rendering upload, do not store.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Option<Float32Array> {
        self.layout
            .as_ref()
            .map(|layout| unsafe { Float32Array::view(layout.positions_y()) })
    }

    /// Get interleaved [x0, y0, x1, y1, ...] positions as a copied array.
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Option<Float32Array> {
        self.layout.as_ref().map(interleave)
    }

    /// Get the layout as a plain JS object mapping node id to [x, y].
    #[wasm_bindgen(js_name = layoutMap)]
    pub fn layout_map(&self) -> Result<JsValue, JsError> {
        let layout = self.require_layout()?;
        let map = layout.to_map(&self.tree);
        map.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| JsError::new(&format!("failed to serialize layout: {e}")))
    }

    /// Get a node's laid-out X position.
    #[wasm_bindgen(js_name = getNodeX)]
    pub fn get_node_x(&self, slot: u32) -> Option<f32> {
        self.layout
            .as_ref()
            .and_then(|l| l.position(NodeIdx::new(slot)))
            .map(|(x, _)| x)
    }

    /// Get a node's laid-out Y position.
    #[wasm_bindgen(js_name = getNodeY)]
    pub fn get_node_y(&self, slot: u32) -> Option<f32> {
        self.layout
            .as_ref()
            .and_then(|l| l.position(NodeIdx::new(slot)))
            .map(|(_, y)| y)
    }

    /// Get the layout bounding box as [min_x, min_y, max_x, max_y].
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f32>> {
        self.layout
            .as_ref()
            .and_then(|l| l.bounds())
            .map(|(min_x, min_y, max_x, max_y)| vec![min_x, min_y, max_x, max_y])
    }

    // =========================================================================
    // Hit Testing
    // =========================================================================

    /// Find the nearest node within a maximum distance of a point.
    #[wasm_bindgen(js_name = findNodeAt)]
    pub fn find_node_at(&self, x: f32, y: f32, max_distance: f32) -> Option<u32> {
        self.spatial
            .nearest_within(x, y, max_distance)
            .map(|idx| idx.raw())
    }

    /// Find the nearest person within a maximum distance of a point.
    ///
    /// Union nodes are skipped so a marriage dot never swallows a click
    /// aimed at a person card next to it.
    #[wasm_bindgen(js_name = findPersonAt)]
    pub fn find_person_at(&self, x: f32, y: f32, max_distance: f32) -> Option<u32> {
        self.spatial
            .in_radius(x, y, max_distance)
            .into_iter()
            .find(|&idx| self.tree.kind(idx) == Some(NodeKind::Person))
            .map(|idx| idx.raw())
    }

    /// Find all nodes within a rectangular region.
    #[wasm_bindgen(js_name = findNodesInRect)]
    pub fn find_nodes_in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<u32> {
        self.spatial
            .in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(|idx| idx.raw())
            .collect()
    }

    /// Rebuild the spatial index from the current layout.
    ///
    /// `computeLayout` already does this; call it only after restoring an
    /// engine whose index was cleared.
    #[wasm_bindgen(js_name = rebuildSpatialIndex)]
    pub fn rebuild_spatial_index(&mut self) {
        match &self.layout {
            Some(layout) => self.spatial.rebuild(layout),
            None => self.spatial.clear(),
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Log node count and layout bounds to the browser console.
    #[wasm_bindgen(js_name = logSummary)]
    pub fn log_summary(&self) {
        let summary = match self.layout.as_ref().and_then(|l| l.bounds()) {
            Some((min_x, min_y, max_x, max_y)) => format!(
                "stemma: {} nodes, layout bounds ({min_x}, {min_y})..({max_x}, {max_y})",
                self.tree.len()
            ),
            None => format!("stemma: {} nodes, no layout", self.tree.len()),
        };
        web_sys::console::info_1(&summary.into());
    }
}

impl StemmaWasm {
    fn compute_with_config(&mut self, root: u32, config: TidyConfig) -> Result<(), JsError> {
        self.invalidate();
        let layout = TidyLayout::new(config).compute(&self.tree, NodeIdx::new(root))?;
        self.spatial.rebuild(&layout);
        self.layout = Some(layout);
        Ok(())
    }

    fn require_layout(&self) -> Result<&TreeLayout, JsError> {
        self.layout
            .as_ref()
            .ok_or_else(|| JsError::new("no layout computed yet"))
    }

    fn invalidate(&mut self) {
        self.layout = None;
        self.spatial.clear();
    }

    /// Direct access to the arena for Rust callers embedding the engine.
    pub fn family_tree(&self) -> &FamilyTree {
        &self.tree
    }

    /// The most recent layout, if any, for Rust callers.
    pub fn tree_layout(&self) -> Option<&TreeLayout> {
        self.layout.as_ref()
    }
}

impl Default for StemmaWasm {
    fn default() -> Self {
        Self::new()
    }
}

/// Interleave a layout's buffers into [x0, y0, x1, y1, ...].
fn interleave(layout: &TreeLayout) -> Float32Array {
    let mut positions = Vec::with_capacity(layout.len() * 2);
    for (&x, &y) in layout.positions_x().iter().zip(layout.positions_y()) {
        positions.push(x);
        positions.push(y);
    }
    Float32Array::from(&positions[..])
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::error::LayoutError;

    /// Build a three-generation family: a grandparent couple joined by a
    /// union node, their two children, and grandchildren on one side.
    fn sample_family() -> (FamilyTree, NodeIdx) {
        let mut tree = FamilyTree::new();
        let union = tree.add_union("u:chen").unwrap();
        let elder = tree.add_person("p:elder-son").unwrap();
        let younger = tree.add_person("p:younger-son").unwrap();
        tree.attach(union, elder);
        tree.attach(union, younger);

        let elder_union = tree.add_union("u:elder").unwrap();
        tree.attach(elder, elder_union);
        for id in ["p:grandchild-1", "p:grandchild-2"] {
            let g = tree.add_person(id).unwrap();
            tree.attach(elder_union, g);
        }
        (tree, union)
    }

    /// Test the full pipeline: arena -> tidy layout -> spatial queries.
    #[test]
    fn test_tree_to_layout_to_hit_test() {
        let (tree, root) = sample_family();
        let layout = TidyLayout::new(TidyConfig {
            min_separation: 100.0,
            level_gap: 80.0,
        })
        .compute(&tree, root)
        .unwrap();

        let map = layout.to_map(&tree);
        assert_eq!(map.len(), tree.len());

        // One rank per generation.
        assert_eq!(map["u:chen"].1, 0.0);
        assert_eq!(map["p:elder-son"].1, 80.0);
        assert_eq!(map["u:elder"].1, 160.0);
        assert_eq!(map["p:grandchild-1"].1, 240.0);

        // The union sits centered over the couple's children.
        let mid = (map["p:elder-son"].0 + map["p:younger-son"].0) / 2.0;
        assert!((map["u:chen"].0 - mid).abs() < 1e-3);

        let mut spatial = SpatialIndex::new();
        spatial.rebuild(&layout);
        let (gx, gy) = map["p:grandchild-2"];
        assert_eq!(
            spatial.nearest_within(gx + 5.0, gy - 5.0, 20.0),
            tree.slot_of("p:grandchild-2")
        );
    }

    /// Drive the wasm facade through its Rust-callable surface.
    #[test]
    fn test_facade_layout_and_person_hit_test() {
        let mut engine = StemmaWasm::new();
        let union = engine.add_union("u1".into()).unwrap();
        let person = engine.add_person("p1".into()).unwrap();
        let sibling = engine.add_person("p2".into()).unwrap();
        assert!(engine.attach_child(union, person));
        assert!(engine.attach_child(union, sibling));

        assert!(engine.compute_layout(union, 120.0, 140.0).is_ok());
        assert!(engine.has_layout());
        assert_eq!(engine.family_tree().len(), 3);
        assert_eq!(engine.tree_layout().map(|l| l.len()), Some(3));
        assert_eq!(engine.get_node_y(person), Some(140.0));
        assert_eq!(engine.get_bounds(), Some(vec![0.0, 0.0, 120.0, 140.0]));

        // Clicking midway between the union anchor and a person resolves to
        // the person even though the union is closer.
        let px = engine.get_node_x(person).unwrap();
        let ux = engine.get_node_x(union).unwrap();
        let near_union = (px + ux) / 2.0 + 10.0;
        assert_eq!(engine.find_person_at(near_union, 60.0, 200.0), Some(person));
        assert_eq!(engine.find_node_at(px, 140.0, 10.0), Some(person));
    }

    /// Bulk loading mirrors the UI's initial hydration path.
    #[test]
    fn test_facade_bulk_loading() {
        let mut engine = StemmaWasm::new();
        // loadNodes goes through JsValue and cannot run natively; build the
        // same state through the arena-backed single calls.
        for i in 0..7u32 {
            engine.add_person(format!("n{i}")).unwrap();
        }
        let attached = engine.attach_pairs(&[0, 1, 0, 2, 1, 3, 1, 4, 2, 5, 2, 6, 6, 99]);
        assert_eq!(attached, 6);

        assert!(engine.compute_layout(0, 50.0, 50.0).is_ok());
        assert_eq!(engine.node_count(), 7);
        let in_rect = engine.find_nodes_in_rect(-1.0, 99.0, 1e6, 101.0);
        assert_eq!(in_rect.len(), 4, "four grandchildren on the third rank");
    }

    /// Layout failures clear previous results instead of leaving stale
    /// coordinates behind.
    #[test]
    fn test_facade_failure_is_all_or_nothing() {
        let mut engine = StemmaWasm::new();
        let a = engine.add_person("a".into()).unwrap();
        let b = engine.add_person("b".into()).unwrap();
        engine.attach_child(a, b);
        assert!(engine.compute_layout(a, 120.0, 140.0).is_ok());
        assert!(engine.has_layout());

        // Mutating the tree drops the stale layout, and a failed recompute
        // must not resurrect it.
        engine.attach_child(b, a);
        assert!(!engine.has_layout());
        assert!(engine.compute_layout(a, 120.0, 140.0).is_err());
        assert!(!engine.has_layout());
        assert_eq!(engine.get_node_x(a), None);
        assert_eq!(engine.find_node_at(0.0, 0.0, 1e6), None);
    }

    /// The typed error is preserved for Rust embedders.
    #[test]
    fn test_typed_errors_for_rust_callers() {
        let (tree, root) = sample_family();
        let err = TidyLayout::new(TidyConfig {
            min_separation: -1.0,
            level_gap: 140.0,
        })
        .compute(&tree, root)
        .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidArgument { .. }));
    }
}
