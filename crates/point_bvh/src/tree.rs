//! AabbTree - a built, immutable tree together with the points it indexes.

use glam::Vec3;

use crate::aabb::Aabb;
use crate::builder::TreeBuilder;
use crate::error::{BuildError, InvariantViolation};
use crate::layout::TreeLayout;
use crate::points::PointSet;

/// Immutable implicit AABB tree over a [`PointSet`].
///
/// Owns both the node array and the points so neither can change under an
/// in-flight query. A changed point set means building a new tree. The tree
/// is `Send + Sync`; share it with `Arc` and query from any thread.
#[derive(Clone, Debug)]
pub struct AabbTree {
  pub(crate) points: PointSet,
  pub(crate) layout: TreeLayout,
  pub(crate) nodes: Box<[Aabb]>,
}

impl AabbTree {
  /// Build with the default configuration on rayon's global pool.
  pub fn build(points: impl Into<PointSet>) -> Result<Self, BuildError> {
    TreeBuilder::default().build(points)
  }

  pub(crate) fn from_parts(points: PointSet, layout: TreeLayout, nodes: Box<[Aabb]>) -> Self {
    debug_assert_eq!(nodes.len(), layout.storage_len());
    Self {
      points,
      layout,
      nodes,
    }
  }

  /// The indexed points.
  #[inline]
  pub fn points(&self) -> &PointSet {
    &self.points
  }

  /// Number of indexed points.
  #[inline]
  pub fn point_count(&self) -> usize {
    self.layout.point_count()
  }

  /// Index arithmetic for this tree.
  #[inline]
  pub fn layout(&self) -> &TreeLayout {
    &self.layout
  }

  /// Number of tree levels.
  #[inline]
  pub fn levels(&self) -> u32 {
    self.layout.levels()
  }

  /// The flat node array (`2^L` boxes, padding slot last).
  #[inline]
  pub fn nodes(&self) -> &[Aabb] {
    &self.nodes
  }

  /// All nodes at `depth`, left to right.
  pub fn level(&self, depth: u32) -> &[Aabb] {
    let start = self.layout.level_start(depth);
    &self.nodes[start..start + self.layout.level_width(depth)]
  }

  /// Node `node` at `depth`.
  #[inline]
  pub fn node(&self, depth: u32, node: usize) -> &Aabb {
    &self.nodes[self.layout.node_slot(depth, node)]
  }

  /// The root box, bounding every point.
  #[inline]
  pub fn root(&self) -> &Aabb {
    &self.nodes[self.layout.root_slot()]
  }

  /// Approximate heap footprint of the node array in bytes.
  pub fn node_memory_bytes(&self) -> usize {
    std::mem::size_of_val(&*self.nodes)
  }

  /// Check the structural invariants of the node array.
  ///
  /// - the array holds exactly `2^L` boxes
  /// - every leaf bounds exactly its (clamped) pair of points
  /// - every internal node is the exact union of its two children
  /// - the root contains every point
  ///
  /// Returns the first violation found. Intended for tests and validation
  /// runs; it is O(N).
  pub fn verify(&self) -> Result<(), InvariantViolation> {
    let layout = &self.layout;
    if self.nodes.len() != layout.storage_len() {
      return Err(InvariantViolation::WrongStorageLen {
        expected: layout.storage_len(),
        actual: self.nodes.len(),
      });
    }

    let positions = self.points.as_slice();
    for (leaf, aabb) in self.level(layout.leaf_depth()).iter().enumerate() {
      let (first, second) = layout.leaf_points(leaf);
      if *aabb != Aabb::from_points(positions[first], positions[second]) {
        return Err(InvariantViolation::LeafMismatch { leaf });
      }
    }

    for depth in 0..layout.leaf_depth() {
      let children = self.level(depth + 1);
      for (node, aabb) in self.level(depth).iter().enumerate() {
        if *aabb != children[2 * node].union(&children[2 * node + 1]) {
          return Err(InvariantViolation::UnionMismatch { depth, node });
        }
      }
    }

    let root = self.root();
    if let Some(index) = positions.iter().position(|p| !root.contains_point(*p)) {
      return Err(InvariantViolation::PointOutsideRoot { index });
    }

    Ok(())
  }

  /// Position of point `index`.
  #[inline]
  pub fn point(&self, index: u32) -> Option<Vec3> {
    self.points.get(index as usize)
  }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
