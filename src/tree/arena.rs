//! FamilyTree - arena storage for a rooted family tree.
//!
//! All nodes live in a single flat vector; `children` lists hold slot
//! indices into that vector instead of pointers. Parent back-references,
//! contour threads, and the other cross-links the layout algorithm needs
//! are likewise indices into per-call scratch buffers, which sidesteps
//! ownership cycles entirely and keeps the domain type a plain value.
//!
//! The arena is deliberately permissive: `attach` will happily wire a node
//! under two parents or close a cycle. Those shapes are representable but
//! not layoutable; the layout pass detects them with a visited-set guard
//! and fails before producing any output.

use std::collections::HashMap;

use super::node::{NodeIdx, NodeKind, TreeNode};

/// Arena of family tree nodes with stable string identifiers.
#[derive(Debug, Clone, Default)]
pub struct FamilyTree {
    /// Node storage; `NodeIdx` values index this vector.
    nodes: Vec<TreeNode>,
    /// Map from node id to arena slot.
    slots: HashMap<String, NodeIdx>,
}

impl FamilyTree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(node_capacity),
            slots: HashMap::with_capacity(node_capacity),
        }
    }

    /// Add a node with the given id and kind.
    ///
    /// Returns the assigned slot, or None if the id is already taken.
    pub fn add_node(&mut self, id: impl Into<String>, kind: NodeKind) -> Option<NodeIdx> {
        let id = id.into();
        if self.slots.contains_key(&id) {
            return None;
        }
        let idx = NodeIdx::new(self.nodes.len() as u32);
        self.slots.insert(id.clone(), idx);
        self.nodes.push(TreeNode::new(id, kind));
        Some(idx)
    }

    /// Add a person node.
    pub fn add_person(&mut self, id: impl Into<String>) -> Option<NodeIdx> {
        self.add_node(id, NodeKind::Person)
    }

    /// Add a union (marriage) node.
    pub fn add_union(&mut self, id: impl Into<String>) -> Option<NodeIdx> {
        self.add_node(id, NodeKind::Union)
    }

    /// Append `child` to `parent`'s ordered children.
    ///
    /// Returns false if either slot is out of range or `parent == child`.
    /// Double-parenting and cycles are not rejected here; they are caught
    /// by the layout's tree validation.
    pub fn attach(&mut self, parent: NodeIdx, child: NodeIdx) -> bool {
        if parent == child {
            return false;
        }
        if parent.slot() >= self.nodes.len() || child.slot() >= self.nodes.len() {
            return false;
        }
        self.nodes[parent.slot()].children.push(child);
        true
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `idx` is a valid slot.
    #[inline]
    pub fn contains(&self, idx: NodeIdx) -> bool {
        idx.slot() < self.nodes.len()
    }

    /// Get a node by slot.
    #[inline]
    pub fn node(&self, idx: NodeIdx) -> Option<&TreeNode> {
        self.nodes.get(idx.slot())
    }

    /// Get a node's id by slot.
    pub fn id_of(&self, idx: NodeIdx) -> Option<&str> {
        self.nodes.get(idx.slot()).map(|n| n.id.as_str())
    }

    /// Get the slot for an id.
    pub fn slot_of(&self, id: &str) -> Option<NodeIdx> {
        self.slots.get(id).copied()
    }

    /// Get a node's kind by slot.
    pub fn kind(&self, idx: NodeIdx) -> Option<NodeKind> {
        self.nodes.get(idx.slot()).map(|n| n.kind)
    }

    /// Get a node's ordered children.
    ///
    /// Out-of-range slots yield an empty slice.
    pub fn children(&self, idx: NodeIdx) -> &[NodeIdx] {
        self.nodes
            .get(idx.slot())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate over all nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIdx, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIdx::new(i as u32), n))
    }

    /// Remove all nodes.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.slots.clear();
    }
}
