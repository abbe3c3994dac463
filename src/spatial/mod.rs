//! Spatial indexing for pointer hit testing.
//!
//! Provides O(log n) queries over laid-out node anchors: nearest neighbor,
//! point-in-radius, and rectangle intersection.

mod rtree;

pub use rtree::{NodeAnchor, SpatialIndex};
