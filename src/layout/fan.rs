//! Fan chart projection.
//!
//! Genealogy viewers conventionally offer a fan chart as an alternative to
//! the top-down diagram: the root sits at the center and each generation
//! occupies a ring. This module projects a finished tidy layout into polar
//! coordinates rather than re-running placement, so the tidy pass stays the
//! single source of horizontal ordering and spacing.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::layout::tidy::TreeLayout;
use crate::tree::{FamilyTree, NodeIdx};

/// Parameters for the fan projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FanConfig {
    /// Total angle covered by the fan, in radians. At most a full turn.
    pub sweep_radians: f32,
    /// Radial distance between adjacent generations.
    pub ring_gap: f32,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            sweep_radians: std::f32::consts::PI,
            ring_gap: 140.0,
        }
    }
}

impl FanConfig {
    /// Check that the sweep is a positive angle of at most a full turn and
    /// the ring gap is strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.sweep_radians > 0.0) || self.sweep_radians > TAU {
            return Err(LayoutError::InvalidArgument {
                name: "sweep_radians",
                expected: "a positive angle of at most a full turn",
                value: self.sweep_radians,
            });
        }
        if !(self.ring_gap > 0.0) {
            return Err(LayoutError::non_positive("ring_gap", self.ring_gap));
        }
        Ok(())
    }
}

/// Project a tidy layout into fan coordinates.
///
/// Each node's tidy x, normalized over the layout's horizontal span, becomes
/// an angle in `[0, sweep_radians]`; its generation depth becomes the ring
/// radius. The root lands exactly at the origin. Trees with no horizontal
/// span (a single node or a bare chain) fall on the fan's center ray.
pub fn project_fan(
    tree: &FamilyTree,
    root: NodeIdx,
    layout: &TreeLayout,
    config: &FanConfig,
) -> Result<TreeLayout> {
    config.validate()?;
    if layout.len() != tree.len() {
        return Err(LayoutError::malformed(format!(
            "layout has {} entries but the tree has {} nodes",
            layout.len(),
            tree.len()
        )));
    }
    let depths = generation_depths(tree, root)?;

    let xs = layout.positions_x();
    let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
    let max_x = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = max_x - min_x;

    let mut fan_x = vec![0.0f32; layout.len()];
    let mut fan_y = vec![0.0f32; layout.len()];
    for slot in 0..layout.len() {
        let t = if span > f32::EPSILON {
            (xs[slot] - min_x) / span
        } else {
            0.5
        };
        let angle = t * config.sweep_radians;
        let radius = depths[slot] as f32 * config.ring_gap;
        fan_x[slot] = radius * angle.cos();
        fan_y[slot] = radius * angle.sin();
    }

    Ok(TreeLayout::from_buffers(fan_x, fan_y))
}

/// Depth of every slot below `root`, guarded against malformed wiring.
fn generation_depths(tree: &FamilyTree, root: NodeIdx) -> Result<Vec<u32>> {
    if !tree.contains(root) {
        return Err(LayoutError::malformed(format!(
            "root slot {} out of range (arena has {} nodes)",
            root.raw(),
            tree.len()
        )));
    }

    let mut depths = vec![0u32; tree.len()];
    let mut visited = vec![false; tree.len()];
    let mut stack = vec![(root, 0u32)];
    while let Some((v, depth)) = stack.pop() {
        if visited[v.slot()] {
            return Err(LayoutError::malformed(format!(
                "node '{}' is reachable more than once (cycle or multiple parents)",
                tree.id_of(v).unwrap_or("?")
            )));
        }
        visited[v.slot()] = true;
        depths[v.slot()] = depth;
        for &child in tree.children(v) {
            stack.push((child, depth + 1));
        }
    }

    Ok(depths)
}
