//! Tree node types.
//!
//! A family tree is made of two kinds of nodes:
//! - **Person** nodes, one per individual in the family record.
//! - **Union** nodes, synthetic intermediates representing a marriage, so
//!   that a couple's children hang off a single node.
//!
//! The layout engine treats both identically; the kind only matters to the
//! renderer and the hit tester.

use std::fmt;

/// Arena slot index for a tree node.
///
/// Slots are assigned densely in insertion order and wrap a u32 for
/// efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    /// Create a new NodeIdx from a raw u32.
    #[inline]
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the slot as a usize for buffer indexing.
    #[inline]
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeIdx {
    #[inline]
    fn from(idx: u32) -> Self {
        Self(idx)
    }
}

impl From<NodeIdx> for u32 {
    #[inline]
    fn from(idx: NodeIdx) -> Self {
        idx.0
    }
}

/// What a tree node represents.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// An individual person.
    #[default]
    Person = 0,
    /// A marriage node joining a couple's children under one anchor.
    Union = 1,
}

impl From<u8> for NodeKind {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Union,
            _ => Self::Person,
        }
    }
}

/// A node in the family tree.
///
/// This is the long-lived domain value: an opaque unique identifier, the
/// node kind, and the ordered child slots. Layout scratch (preliminary
/// coordinates, modifiers, contour threads) never lives here; the layout
/// pass owns its own parallel buffer for the duration of a single call.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Opaque unique identifier, the key in layout output maps.
    pub id: String,
    /// Person or union.
    pub kind: NodeKind,
    /// Ordered children. Order is significant and preserved by layout.
    pub children: Vec<NodeIdx>,
}

impl TreeNode {
    /// Create a new childless node.
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Whether this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
