//! R-tree based hit testing using the rstar crate.
//!
//! After a layout pass the UI needs to resolve pointer events against node
//! anchors: which card was clicked, what is under the cursor, which nodes
//! fall inside a rubber-band selection. The index is rebuilt from the
//! finished layout in one bulk load.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::layout::TreeLayout;
use crate::tree::NodeIdx;

/// A laid-out node anchor in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAnchor {
    /// Arena slot of the node.
    pub idx: NodeIdx,
    /// X coordinate in layout units.
    pub x: f32,
    /// Y coordinate in layout units.
    pub y: f32,
}

impl NodeAnchor {
    /// Create a new anchor.
    pub fn new(idx: NodeIdx, x: f32, y: f32) -> Self {
        Self { idx, x, y }
    }
}

impl RTreeObject for NodeAnchor {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodeAnchor {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        (self.x - point[0]).abs() < f32::EPSILON && (self.y - point[1]).abs() < f32::EPSILON
    }
}

/// Spatial index over laid-out tree nodes.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<NodeAnchor>,
}

impl SpatialIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from a finished layout in one bulk load.
    pub fn rebuild(&mut self, layout: &TreeLayout) {
        let anchors: Vec<NodeAnchor> = layout
            .positions_x()
            .iter()
            .zip(layout.positions_y())
            .enumerate()
            .map(|(slot, (&x, &y))| NodeAnchor::new(NodeIdx::new(slot as u32), x, y))
            .collect();
        self.tree = RTree::bulk_load(anchors);
    }

    /// Number of indexed anchors.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Find the nearest node to a point.
    pub fn nearest(&self, x: f32, y: f32) -> Option<NodeIdx> {
        self.tree.nearest_neighbor(&[x, y]).map(|anchor| anchor.idx)
    }

    /// Find the nearest node within a maximum distance.
    pub fn nearest_within(&self, x: f32, y: f32, max_distance: f32) -> Option<NodeIdx> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|anchor| anchor.distance_2(&[x, y]) <= max_distance_sq)
            .map(|anchor| anchor.idx)
    }

    /// Find all nodes within a rectangle.
    pub fn in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<NodeIdx> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|anchor| anchor.idx)
            .collect()
    }

    /// Find all nodes within a radius of a point, nearest first.
    pub fn in_radius(&self, x: f32, y: f32, radius: f32) -> Vec<NodeIdx> {
        let radius_sq = radius * radius;
        let mut hits: Vec<(f32, NodeIdx)> = self
            .tree
            .locate_within_distance([x, y], radius_sq)
            .map(|anchor| (anchor.distance_2(&[x, y]), anchor.idx))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, idx)| idx).collect()
    }

    /// Drop all anchors.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }
}
