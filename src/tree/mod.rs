//! Family tree data structure.
//!
//! This module provides the arena-backed tree the layout algorithms
//! consume: person and union nodes with stable string ids, stored in a
//! flat vector and linked by slot indices.

mod arena;
mod node;

pub use arena::FamilyTree;
pub use node::{NodeIdx, NodeKind, TreeNode};
