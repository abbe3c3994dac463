//! Tidy tree layout for family diagrams.
//!
//! Implements the O(n) algorithm from "Improving Walker's Algorithm to Run
//! in Linear Time" (Buchheim, Junger, Leipert, 2002) for laying out ordered
//! m-ary trees with compact, aesthetically pleasing positioning. Produces
//! one (x, y) per node where y is fixed by generation depth and x centers
//! every parent over its children while keeping adjacent subtrees at least
//! `min_separation` apart.
//!
//! # Algorithm Overview
//!
//! 1. **Validation walk:** depth-first from the root with a visited-set
//!    guard. A node reached twice (cycle or double parent) or a slot never
//!    reached fails the call before any scratch is touched by the layout
//!    passes. Assigns parent, depth, and 1-based sibling number.
//! 2. **First walk (post-order):** assigns preliminary x-coordinates. After
//!    each subtree finishes, `apportion` walks the right contour of the left
//!    sibling's subtree against the left contour of the new subtree and
//!    shifts the new subtree right to resolve overlap, spreading the shift
//!    evenly across intermediate siblings. Exhausted contours are stitched
//!    with thread links so later walks skip absorbed subtrees in O(1).
//! 3. **Second walk (pre-order):** accumulates modifiers into final x and
//!    maps depth to y.
//!
//! All traversals use explicit stacks; a ten-thousand-generation pedigree
//! cannot overflow the call stack. Coordinates are translated at the end so
//! the minimum x is exactly zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::tree::{FamilyTree, NodeIdx};

/// Spacing parameters for the tidy layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TidyConfig {
    /// Minimum horizontal gap between node anchors at the same depth.
    pub min_separation: f32,
    /// Vertical distance between adjacent generations.
    pub level_gap: f32,
}

impl Default for TidyConfig {
    fn default() -> Self {
        Self {
            min_separation: 120.0,
            level_gap: 140.0,
        }
    }
}

impl TidyConfig {
    /// Check that both spacing parameters are strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_separation > 0.0) {
            return Err(LayoutError::non_positive(
                "min_separation",
                self.min_separation,
            ));
        }
        if !(self.level_gap > 0.0) {
            return Err(LayoutError::non_positive("level_gap", self.level_gap));
        }
        Ok(())
    }
}

/// Finished coordinates, one (x, y) per arena slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    positions_x: Vec<f32>,
    positions_y: Vec<f32>,
}

impl TreeLayout {
    pub(crate) fn from_buffers(positions_x: Vec<f32>, positions_y: Vec<f32>) -> Self {
        Self {
            positions_x,
            positions_y,
        }
    }

    /// Number of laid-out nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions_x.len()
    }

    /// Whether the layout is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions_x.is_empty()
    }

    /// X positions in arena slot order.
    #[inline]
    pub fn positions_x(&self) -> &[f32] {
        &self.positions_x
    }

    /// Y positions in arena slot order.
    #[inline]
    pub fn positions_y(&self) -> &[f32] {
        &self.positions_y
    }

    /// Position of a single node.
    pub fn position(&self, idx: NodeIdx) -> Option<(f32, f32)> {
        let slot = idx.slot();
        if slot < self.positions_x.len() {
            Some((self.positions_x[slot], self.positions_y[slot]))
        } else {
            None
        }
    }

    /// The id -> (x, y) mapping, exactly one entry per node.
    pub fn to_map(&self, tree: &FamilyTree) -> HashMap<String, (f32, f32)> {
        tree.iter()
            .map(|(idx, node)| {
                let slot = idx.slot();
                (
                    node.id.clone(),
                    (self.positions_x[slot], self.positions_y[slot]),
                )
            })
            .collect()
    }

    /// Bounding box as (min_x, min_y, max_x, max_y), or None when empty.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        if self.is_empty() {
            return None;
        }
        let min_x = self.positions_x.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = self
            .positions_x
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let min_y = self.positions_y.iter().copied().fold(f32::INFINITY, f32::min);
        let max_y = self
            .positions_y
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        Some((min_x, min_y, max_x, max_y))
    }
}

/// The tidy tree layout engine.
pub struct TidyLayout {
    config: TidyConfig,
}

impl TidyLayout {
    /// Create a layout engine with the given configuration.
    pub fn new(config: TidyConfig) -> Self {
        Self { config }
    }

    /// Create a layout engine with default genealogical spacing.
    pub fn with_defaults() -> Self {
        Self::new(TidyConfig::default())
    }

    /// The active configuration.
    pub fn config(&self) -> &TidyConfig {
        &self.config
    }

    /// Compute the layout of the tree rooted at `root`.
    ///
    /// Fails with `InvalidArgument` when a spacing parameter is not strictly
    /// positive, and with `MalformedTree` when the arena does not form a
    /// finite rooted tree under `root`. No partial output is ever produced.
    pub fn compute(&self, tree: &FamilyTree, root: NodeIdx) -> Result<TreeLayout> {
        self.config.validate()?;

        let scratch = index_tree(tree, root)?;
        let mut walk = Walk {
            tree,
            sep: self.config.min_separation,
            s: scratch,
        };
        walk.first_walk(root.raw());

        let (mut xs, ys) = walk.second_walk(root.raw(), self.config.level_gap);

        // Translate so the leftmost anchor sits exactly at x = 0.
        let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
        for x in &mut xs {
            *x -= min_x;
        }

        Ok(TreeLayout::from_buffers(xs, ys))
    }
}

/// Per-node scratch for a single layout pass, parallel to the arena.
#[derive(Debug, Clone)]
struct Scratch {
    /// Provisional x within the local subtree.
    prelim: f32,
    /// Horizontal shift inherited by the whole subtree.
    modifier: f32,
    /// Pending shift from move_subtree, settled by execute_shifts.
    shift: f32,
    /// Per-gap correction from move_subtree, settled by execute_shifts.
    change: f32,
    /// Contour shortcut installed when this subtree's contour ends early.
    thread: Option<u32>,
    /// Highest distinct ancestor used to anchor shift distribution.
    ancestor: u32,
    /// Running default ancestor while this node's children are placed.
    default_ancestor: u32,
    /// Parent slot; None for the root.
    parent: Option<u32>,
    /// 1-based position among siblings.
    number: u32,
    /// Generations below the root.
    depth: u32,
}

impl Scratch {
    fn new(slot: u32) -> Self {
        Self {
            prelim: 0.0,
            modifier: 0.0,
            shift: 0.0,
            change: 0.0,
            thread: None,
            ancestor: slot,
            default_ancestor: slot,
            parent: None,
            number: 1,
            depth: 0,
        }
    }
}

/// Validate the tree shape and assign parent/depth/number scratch.
///
/// Walks depth-first from the root with an explicit stack. Every slot must
/// be reached exactly once: a second visit means a cycle or a node wired
/// under two parents, and a missed slot means the arena is not a single
/// rooted tree.
fn index_tree(tree: &FamilyTree, root: NodeIdx) -> Result<Vec<Scratch>> {
    if !tree.contains(root) {
        return Err(LayoutError::malformed(format!(
            "root slot {} out of range (arena has {} nodes)",
            root.raw(),
            tree.len()
        )));
    }

    let n = tree.len();
    let mut scratch: Vec<Scratch> = (0..n).map(|i| Scratch::new(i as u32)).collect();
    let mut visited = vec![false; n];
    let mut reached = 0usize;

    let mut stack: Vec<(u32, Option<u32>, u32, u32)> = vec![(root.raw(), None, 0, 1)];
    while let Some((v, parent, depth, number)) = stack.pop() {
        let slot = v as usize;
        if visited[slot] {
            return Err(LayoutError::malformed(format!(
                "node '{}' is reachable more than once (cycle or multiple parents)",
                tree.id_of(NodeIdx::new(v)).unwrap_or("?")
            )));
        }
        visited[slot] = true;
        reached += 1;

        let s = &mut scratch[slot];
        s.parent = parent;
        s.depth = depth;
        s.number = number;

        for (i, &child) in tree.children(NodeIdx::new(v)).iter().enumerate() {
            stack.push((child.raw(), Some(v), depth + 1, (i + 1) as u32));
        }
    }

    if reached != n {
        return Err(LayoutError::malformed(format!(
            "{} node(s) not reachable from root '{}'",
            n - reached,
            tree.id_of(root).unwrap_or("?")
        )));
    }

    Ok(scratch)
}

/// One layout pass over a validated tree.
struct Walk<'a> {
    tree: &'a FamilyTree,
    sep: f32,
    s: Vec<Scratch>,
}

enum Frame {
    Enter(u32),
    Leave(u32),
}

impl<'a> Walk<'a> {
    #[inline]
    fn children(&self, v: u32) -> &'a [NodeIdx] {
        self.tree.children(NodeIdx::new(v))
    }

    /// The sibling immediately left of `v`, found in O(1) via its number.
    fn left_sibling(&self, v: u32) -> Option<u32> {
        let sv = &self.s[v as usize];
        let parent = sv.parent?;
        if sv.number < 2 {
            return None;
        }
        Some(self.children(parent)[(sv.number - 2) as usize].raw())
    }

    /// The leftmost node in `v`'s sibling group.
    fn leftmost_sibling(&self, v: u32) -> u32 {
        match self.s[v as usize].parent {
            Some(p) => self.children(p)[0].raw(),
            None => v,
        }
    }

    /// Next node on the left contour of `v`'s subtree.
    #[inline]
    fn next_left(&self, v: u32) -> Option<u32> {
        match self.children(v).first() {
            Some(first) => Some(first.raw()),
            None => self.s[v as usize].thread,
        }
    }

    /// Next node on the right contour of `v`'s subtree.
    #[inline]
    fn next_right(&self, v: u32) -> Option<u32> {
        match self.children(v).last() {
            Some(last) => Some(last.raw()),
            None => self.s[v as usize].thread,
        }
    }

    /// Post-order assignment of preliminary coordinates.
    fn first_walk(&mut self, root: u32) {
        let mut stack = vec![Frame::Enter(root)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(v) => {
                    stack.push(Frame::Leave(v));
                    for &child in self.children(v).iter().rev() {
                        stack.push(Frame::Enter(child.raw()));
                    }
                }
                Frame::Leave(v) => {
                    self.place(v);
                    // Resolve this finished subtree against its left
                    // sibling's before any right sibling is placed.
                    if let Some(parent) = self.s[v as usize].parent {
                        let da = if self.s[v as usize].number == 1 {
                            v
                        } else {
                            self.apportion(v, self.s[parent as usize].default_ancestor)
                        };
                        self.s[parent as usize].default_ancestor = da;
                    }
                }
            }
        }
    }

    /// Assign `v`'s preliminary x once all of its children are placed.
    fn place(&mut self, v: u32) {
        let children = self.children(v);
        if children.is_empty() {
            self.s[v as usize].prelim = match self.left_sibling(v) {
                Some(w) => self.s[w as usize].prelim + self.sep,
                None => 0.0,
            };
            return;
        }

        self.execute_shifts(v);

        let first = children[0].slot();
        let last = children[children.len() - 1].slot();
        let midpoint = (self.s[first].prelim + self.s[last].prelim) / 2.0;

        match self.left_sibling(v) {
            Some(w) => {
                let prelim = self.s[w as usize].prelim + self.sep;
                self.s[v as usize].prelim = prelim;
                self.s[v as usize].modifier = prelim - midpoint;
            }
            None => self.s[v as usize].prelim = midpoint,
        }
    }

    /// Resolve overlap between `v`'s subtree and everything to its left.
    ///
    /// Walks the right contour of the left neighborhood and the left contour
    /// of `v`'s subtree level by level, following thread links past subtree
    /// boundaries. Any positive shift moves `v` right, charged against the
    /// correct ancestor so execute_shifts can spread it evenly. When one
    /// contour runs out first, a thread link is installed to keep later
    /// contour walks amortized O(1) per level.
    fn apportion(&mut self, v: u32, mut default_ancestor: u32) -> u32 {
        let Some(left) = self.left_sibling(v) else {
            return default_ancestor;
        };

        let mut inner_left = left;
        let mut outer_left = self.leftmost_sibling(v);
        let mut inner_right = v;
        let mut outer_right = v;

        let mut mod_inner_left = self.s[inner_left as usize].modifier;
        let mut mod_outer_left = self.s[outer_left as usize].modifier;
        let mut mod_inner_right = self.s[inner_right as usize].modifier;
        let mut mod_outer_right = self.s[outer_right as usize].modifier;

        loop {
            let (Some(next_il), Some(next_ir)) =
                (self.next_right(inner_left), self.next_left(inner_right))
            else {
                break;
            };
            inner_left = next_il;
            inner_right = next_ir;
            if let Some(next) = self.next_left(outer_left) {
                outer_left = next;
            }
            if let Some(next) = self.next_right(outer_right) {
                outer_right = next;
            }

            self.s[outer_right as usize].ancestor = v;

            let shift = (self.s[inner_left as usize].prelim + mod_inner_left)
                - (self.s[inner_right as usize].prelim + mod_inner_right)
                + self.sep;
            if shift > 0.0 {
                let anchor = self.shift_anchor(inner_left, v, default_ancestor);
                self.move_subtree(anchor, v, shift);
                mod_inner_right += shift;
                mod_outer_right += shift;
            }

            mod_inner_left += self.s[inner_left as usize].modifier;
            mod_outer_left += self.s[outer_left as usize].modifier;
            mod_inner_right += self.s[inner_right as usize].modifier;
            mod_outer_right += self.s[outer_right as usize].modifier;
        }

        // The left neighborhood is deeper: thread the right outer contour
        // into it so the merged subtree presents a single contour.
        if self.next_right(inner_left).is_some() && self.next_right(outer_right).is_none() {
            self.s[outer_right as usize].thread = self.next_right(inner_left);
            self.s[outer_right as usize].modifier += mod_inner_left - mod_outer_right;
        }
        // v's subtree is deeper: thread the left outer contour into it.
        if self.next_left(inner_right).is_some() && self.next_left(outer_left).is_none() {
            self.s[outer_left as usize].thread = self.next_left(inner_right);
            self.s[outer_left as usize].modifier += mod_inner_right - mod_outer_left;
            default_ancestor = v;
        }

        default_ancestor
    }

    /// Which left sibling absorbs a required shift.
    fn shift_anchor(&self, inner_left: u32, v: u32, default_ancestor: u32) -> u32 {
        let candidate = self.s[inner_left as usize].ancestor;
        if self.s[candidate as usize].parent == self.s[v as usize].parent {
            candidate
        } else {
            default_ancestor
        }
    }

    /// Move `right`'s subtree by `shift`, recording an even distribution of
    /// the gap across the subtrees between `left` and `right`.
    fn move_subtree(&mut self, left: u32, right: u32, shift: f32) {
        let gaps = self.s[right as usize]
            .number
            .saturating_sub(self.s[left as usize].number)
            .max(1) as f32;
        self.s[right as usize].change -= shift / gaps;
        self.s[right as usize].shift += shift;
        self.s[left as usize].change += shift / gaps;
        self.s[right as usize].prelim += shift;
        self.s[right as usize].modifier += shift;
    }

    /// Settle the shift/change bookkeeping across `v`'s children.
    fn execute_shifts(&mut self, v: u32) {
        let mut shift = 0.0f32;
        let mut change = 0.0f32;
        for &child in self.children(v).iter().rev() {
            let c = child.slot();
            self.s[c].prelim += shift;
            self.s[c].modifier += shift;
            change += self.s[c].change;
            shift += self.s[c].shift + change;
        }
    }

    /// Pre-order pass: fold inherited modifiers into final coordinates.
    fn second_walk(&self, root: u32, level_gap: f32) -> (Vec<f32>, Vec<f32>) {
        let n = self.s.len();
        let mut xs = vec![0.0f32; n];
        let mut ys = vec![0.0f32; n];

        let mut stack: Vec<(u32, f32)> = vec![(root, 0.0)];
        while let Some((v, mod_sum)) = stack.pop() {
            let slot = v as usize;
            xs[slot] = self.s[slot].prelim + mod_sum;
            ys[slot] = self.s[slot].depth as f32 * level_gap;

            let child_mod = mod_sum + self.s[slot].modifier;
            for &child in self.children(v).iter().rev() {
                stack.push((child.raw(), child_mod));
            }
        }

        (xs, ys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    /// Balanced tree: node i hangs under node (i - 1) / arity.
    fn balanced(n: u32, arity: u32) -> (FamilyTree, NodeIdx) {
        let mut tree = FamilyTree::with_capacity(n as usize);
        let root = tree.add_person("n0").unwrap();
        for i in 1..n {
            let child = tree.add_person(format!("n{i}")).unwrap();
            assert!(tree.attach(NodeIdx::new((i - 1) / arity), child));
        }
        (tree, root)
    }

    /// Irregular tree: breadth-first growth where each parent takes
    /// 5/3/2/1/0 children depending on its slot, like a real pedigree with
    /// hub ancestors and childless branches.
    fn irregular(n: u32) -> (FamilyTree, NodeIdx) {
        let mut tree = FamilyTree::with_capacity(n as usize);
        let root = tree.add_person("n0").unwrap();
        let mut queue = vec![root];
        let mut next = 1u32;
        while next < n {
            let mut frontier = Vec::new();
            for &parent in &queue {
                let count = match parent.raw() % 5 {
                    0 => 5,
                    1 => 3,
                    2 => 2,
                    3 => 1,
                    _ => 0,
                };
                for _ in 0..count {
                    if next >= n {
                        break;
                    }
                    let child = tree.add_person(format!("n{next}")).unwrap();
                    tree.attach(parent, child);
                    frontier.push(child);
                    next += 1;
                }
            }
            if frontier.is_empty() {
                break;
            }
            queue = frontier;
        }
        (tree, root)
    }

    /// Depth of every node, computed independently of the layout.
    fn depths(tree: &FamilyTree, root: NodeIdx) -> Vec<u32> {
        let mut out = vec![0u32; tree.len()];
        let mut stack = vec![(root, 0u32)];
        while let Some((v, d)) = stack.pop() {
            out[v.slot()] = d;
            for &c in tree.children(v) {
                stack.push((c, d + 1));
            }
        }
        out
    }

    #[test]
    fn test_single_node() {
        let mut tree = FamilyTree::new();
        let root = tree.add_person("only").unwrap();

        let layout = TidyLayout::with_defaults().compute(&tree, root).unwrap();
        let map = layout.to_map(&tree);
        assert_eq!(map.len(), 1);
        assert_eq!(map["only"], (0.0, 0.0));
    }

    #[test]
    fn test_two_children_exact_positions() {
        let mut tree = FamilyTree::new();
        let root = tree.add_person("root").unwrap();
        let left = tree.add_person("left").unwrap();
        let right = tree.add_person("right").unwrap();
        tree.attach(root, left);
        tree.attach(root, right);

        let layout = TidyLayout::new(TidyConfig {
            min_separation: 120.0,
            level_gap: 140.0,
        })
        .compute(&tree, root)
        .unwrap();

        let map = layout.to_map(&tree);
        assert_eq!(map["left"], (0.0, 140.0));
        assert_eq!(map["right"], (120.0, 140.0));
        assert_eq!(map["root"], (60.0, 0.0));
    }

    #[test]
    fn test_asymmetric_subtrees() {
        // Left child has three leaf children, right child has one. The
        // right subtree must clear the left subtree's rightmost leaf while
        // the right child stays centered over its only child.
        let mut tree = FamilyTree::new();
        let root = tree.add_person("root").unwrap();
        let a = tree.add_person("a").unwrap();
        let b = tree.add_person("b").unwrap();
        tree.attach(root, a);
        tree.attach(root, b);
        for id in ["a1", "a2", "a3"] {
            let leaf = tree.add_person(id).unwrap();
            tree.attach(a, leaf);
        }
        let b1 = tree.add_person("b1").unwrap();
        tree.attach(b, b1);

        let sep = 100.0;
        let layout = TidyLayout::new(TidyConfig {
            min_separation: sep,
            level_gap: 100.0,
        })
        .compute(&tree, root)
        .unwrap();
        let map = layout.to_map(&tree);

        // Leaves of the left subtree.
        assert_eq!(map["a1"].0, 0.0);
        assert_eq!(map["a2"].0, 100.0);
        assert_eq!(map["a3"].0, 200.0);
        // The lone grandchild clears a3 by at least the separation.
        assert!(map["b1"].0 - map["a3"].0 >= sep - 1e-3);
        // b is centered over its one child.
        assert!((map["b"].0 - map["b1"].0).abs() < 1e-3);
        // Root is centered over a and b.
        let mid = (map["a"].0 + map["b"].0) / 2.0;
        assert!((map["root"].0 - mid).abs() < 1e-3);
    }

    #[test]
    fn test_depth_to_y_is_exact() {
        let (tree, root) = balanced(40, 3);
        let gap = 140.0;
        let layout = TidyLayout::new(TidyConfig {
            min_separation: 120.0,
            level_gap: gap,
        })
        .compute(&tree, root)
        .unwrap();

        let expected = depths(&tree, root);
        for (idx, _) in tree.iter() {
            let (_, y) = layout.position(idx).unwrap();
            assert_eq!(y, expected[idx.slot()] as f32 * gap, "node {idx}");
        }
    }

    #[test]
    fn test_min_x_is_zero() {
        for (tree, root) in [balanced(1, 2), balanced(7, 2), balanced(100, 3), irregular(150)] {
            let layout = TidyLayout::with_defaults().compute(&tree, root).unwrap();
            let (min_x, ..) = layout.bounds().unwrap();
            assert_eq!(min_x, 0.0);
        }
    }

    #[test]
    fn test_no_overlap_at_same_depth() {
        let sep = 50.0;
        for (tree, root) in [balanced(127, 2), balanced(121, 3), irregular(200)] {
            let layout = TidyLayout::new(TidyConfig {
                min_separation: sep,
                level_gap: 60.0,
            })
            .compute(&tree, root)
            .unwrap();

            let depth = depths(&tree, root);
            let max_depth = *depth.iter().max().unwrap() as usize;
            let mut by_level: Vec<Vec<f32>> = vec![Vec::new(); max_depth + 1];
            for (idx, _) in tree.iter() {
                by_level[depth[idx.slot()] as usize].push(layout.position(idx).unwrap().0);
            }
            for xs in &mut by_level {
                xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
                for pair in xs.windows(2) {
                    assert!(
                        pair[1] - pair[0] >= sep - 1e-3,
                        "nodes {} and {} closer than {sep}",
                        pair[0],
                        pair[1]
                    );
                }
            }
        }
    }

    #[test]
    fn test_parents_centered_over_children() {
        for (tree, root) in [balanced(85, 4), irregular(120)] {
            let layout = TidyLayout::with_defaults().compute(&tree, root).unwrap();
            for (idx, node) in tree.iter() {
                if node.children.is_empty() {
                    continue;
                }
                let first = layout.position(node.children[0]).unwrap().0;
                let last = layout
                    .position(*node.children.last().unwrap())
                    .unwrap()
                    .0;
                let x = layout.position(idx).unwrap().0;
                assert!(
                    (x - (first + last) / 2.0).abs() < 1e-2,
                    "node {idx}: x={x}, children span {first}..{last}"
                );
            }
        }
    }

    #[test]
    fn test_sibling_order_preserved() {
        let (tree, root) = irregular(80);
        let layout = TidyLayout::with_defaults().compute(&tree, root).unwrap();
        for (_, node) in tree.iter() {
            for pair in node.children.windows(2) {
                let left = layout.position(pair[0]).unwrap().0;
                let right = layout.position(pair[1]).unwrap().0;
                assert!(left < right);
            }
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let build = || {
            let mut tree = FamilyTree::new();
            let root = tree.add_person("r").unwrap();
            let u = tree.add_union("u1").unwrap();
            tree.attach(root, u);
            for i in 0..6 {
                let c = tree.add_node(format!("c{i}"), NodeKind::Person).unwrap();
                tree.attach(u, c);
                if i % 2 == 0 {
                    let g = tree.add_person(format!("g{i}")).unwrap();
                    tree.attach(c, g);
                }
            }
            (tree, root)
        };

        let (tree_a, root_a) = build();
        let (tree_b, root_b) = build();
        let layout_a = TidyLayout::with_defaults().compute(&tree_a, root_a).unwrap();
        let layout_b = TidyLayout::with_defaults().compute(&tree_b, root_b).unwrap();
        assert_eq!(layout_a, layout_b);
        assert_eq!(layout_a.to_map(&tree_a), layout_b.to_map(&tree_b));
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let depth = 10_000u32;
        let mut tree = FamilyTree::with_capacity(depth as usize);
        let root = tree.add_person("n0").unwrap();
        let mut parent = root;
        for i in 1..depth {
            let child = tree.add_person(format!("n{i}")).unwrap();
            tree.attach(parent, child);
            parent = child;
        }

        let layout = TidyLayout::new(TidyConfig {
            min_separation: 10.0,
            level_gap: 1.0,
        })
        .compute(&tree, root)
        .unwrap();

        assert_eq!(layout.len(), depth as usize);
        // A bare chain needs no horizontal spread at all.
        for (idx, _) in tree.iter() {
            assert_eq!(layout.position(idx).unwrap().0, 0.0);
        }
        assert_eq!(layout.position(parent).unwrap().1, (depth - 1) as f32);
    }

    #[test]
    fn test_large_tree_full_coverage() {
        let (tree, root) = balanced(10_000, 3);
        let layout = TidyLayout::with_defaults().compute(&tree, root).unwrap();
        let map = layout.to_map(&tree);
        assert_eq!(map.len(), 10_000);
        let (min_x, ..) = layout.bounds().unwrap();
        assert_eq!(min_x, 0.0);
    }

    #[test]
    fn test_double_parent_rejected() {
        let mut tree = FamilyTree::new();
        let root = tree.add_person("root").unwrap();
        let a = tree.add_person("a").unwrap();
        let b = tree.add_person("b").unwrap();
        let shared = tree.add_person("shared").unwrap();
        tree.attach(root, a);
        tree.attach(root, b);
        tree.attach(a, shared);
        tree.attach(b, shared);

        let err = TidyLayout::with_defaults().compute(&tree, root).unwrap_err();
        assert!(matches!(err, LayoutError::MalformedTree { .. }), "{err}");
        assert!(err.to_string().contains("shared"));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = FamilyTree::new();
        let root = tree.add_person("root").unwrap();
        let a = tree.add_person("a").unwrap();
        let b = tree.add_person("b").unwrap();
        tree.attach(root, a);
        tree.attach(a, b);
        tree.attach(b, root);

        let err = TidyLayout::with_defaults().compute(&tree, root).unwrap_err();
        assert!(matches!(err, LayoutError::MalformedTree { .. }), "{err}");
    }

    #[test]
    fn test_unreachable_node_rejected() {
        let mut tree = FamilyTree::new();
        let root = tree.add_person("root").unwrap();
        tree.add_person("orphan");

        let err = TidyLayout::with_defaults().compute(&tree, root).unwrap_err();
        assert!(matches!(err, LayoutError::MalformedTree { .. }), "{err}");
        assert!(err.to_string().contains("not reachable"));
    }

    #[test]
    fn test_empty_tree_rejected() {
        let tree = FamilyTree::new();
        let err = TidyLayout::with_defaults()
            .compute(&tree, NodeIdx::new(0))
            .unwrap_err();
        assert!(matches!(err, LayoutError::MalformedTree { .. }), "{err}");
    }

    #[test]
    fn test_non_positive_parameters_rejected() {
        let mut tree = FamilyTree::new();
        let root = tree.add_person("root").unwrap();

        for (config, name) in [
            (
                TidyConfig {
                    min_separation: 0.0,
                    level_gap: 140.0,
                },
                "min_separation",
            ),
            (
                TidyConfig {
                    min_separation: 120.0,
                    level_gap: -5.0,
                },
                "level_gap",
            ),
            (
                TidyConfig {
                    min_separation: f32::NAN,
                    level_gap: 140.0,
                },
                "min_separation",
            ),
        ] {
            let err = TidyLayout::new(config).compute(&tree, root).unwrap_err();
            match err {
                LayoutError::InvalidArgument { name: got, .. } => assert_eq!(got, name),
                other => panic!("expected InvalidArgument, got {other}"),
            }
        }
    }

    #[test]
    fn test_config_roundtrips_through_serde() {
        let json = r#"{"minSeparation": 90.0, "levelGap": 75.0}"#;
        let config: TidyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.min_separation, 90.0);
        assert_eq!(config.level_gap, 75.0);

        let config: TidyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.min_separation, 120.0);
        assert_eq!(config.level_gap, 140.0);
    }
}
