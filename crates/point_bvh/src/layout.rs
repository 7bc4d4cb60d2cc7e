//! TreeLayout - index arithmetic for the implicit tree.
//!
//! The tree is a single array of `2^L` boxes. Depth 0 is the root, depth
//! `L-1` holds the leaves.
//!
//! ```text
//! slot:   0 .. 2^(L-1)-1 | .. | 2^L-4  2^L-3 | 2^L-2 | 2^L-1
//! depth:        L-1      | .. |       1      |   0   | padding
//! ```
//!
//! Depth `d` starts at `2^L - 2^(d+1)` and is `2^d` wide, so each level sits
//! directly below its parent level. Node `i` at depth `d` has children `2i`
//! and `2i+1` at depth `d+1`. Leaf `i` owns points `2i` and `2i+1`, clamped
//! to the last point.

/// Largest point count the tree accepts (point ids are `u32`).
pub const MAX_POINTS: usize = u32::MAX as usize;

/// Shape of an implicit tree over `point_count` points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreeLayout {
  point_count: usize,
  levels: u32,
}

impl TreeLayout {
  /// Layout for `point_count` points.
  ///
  /// # Panics
  /// Debug-asserts `point_count > 0`; the builder rejects empty sets before
  /// getting here.
  pub fn new(point_count: usize) -> Self {
    debug_assert!(point_count > 0, "layout needs at least one point");
    Self {
      point_count,
      levels: tree_levels(point_count),
    }
  }

  /// Number of points indexed.
  #[inline]
  pub fn point_count(&self) -> usize {
    self.point_count
  }

  /// Number of tree levels `L`.
  #[inline]
  pub fn levels(&self) -> u32 {
    self.levels
  }

  /// Depth of the leaf level (`L - 1`).
  #[inline]
  pub fn leaf_depth(&self) -> u32 {
    self.levels - 1
  }

  /// Total slot count `2^L`, including the trailing padding slot.
  #[inline]
  pub fn storage_len(&self) -> usize {
    1usize << self.levels
  }

  /// Offset of the first node at `depth`.
  #[inline]
  pub fn level_start(&self, depth: u32) -> usize {
    debug_assert!(depth < self.levels);
    (1usize << self.levels) - (1usize << (depth + 1))
  }

  /// Number of slots at `depth` (`2^depth`).
  #[inline]
  pub fn level_width(&self, depth: u32) -> usize {
    1usize << depth
  }

  /// Flat slot of node `node` at `depth`.
  #[inline]
  pub fn node_slot(&self, depth: u32, node: usize) -> usize {
    debug_assert!(node < self.level_width(depth));
    self.level_start(depth) + node
  }

  /// Slot of the root node.
  #[inline]
  pub fn root_slot(&self) -> usize {
    self.storage_len() - 2
  }

  /// Slot of the unused padding box.
  #[inline]
  pub fn padding_slot(&self) -> usize {
    self.storage_len() - 1
  }

  /// The two point indices owned by `leaf`, clamped to the last point.
  ///
  /// A leaf past the end of the point set degenerates to the last point
  /// counted twice.
  #[inline]
  pub fn leaf_points(&self, leaf: usize) -> (usize, usize) {
    let last = self.point_count - 1;
    ((2 * leaf).min(last), (2 * leaf + 1).min(last))
  }

  /// Number of nodes at `depth` that cover at least one distinct point.
  ///
  /// A node at depth `d` spans `2^(L-d)` point slots, so this is
  /// `ceil(N / 2^(L-d))`. Nodes at or past this index only repeat the last
  /// point and are never visited by queries.
  #[inline]
  pub fn live_width(&self, depth: u32) -> usize {
    let span = 1usize << (self.levels - depth);
    self.point_count.div_ceil(span)
  }
}

/// Number of tree levels for `point_count` points.
///
/// `1` for zero or one point, otherwise `floor(log2(N - 1)) + 1`.
#[inline]
pub fn tree_levels(point_count: usize) -> u32 {
  if point_count <= 1 {
    1
  } else {
    (point_count - 1).ilog2() + 1
  }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;
