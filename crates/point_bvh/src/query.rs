//! Nearest-neighbor queries over a built [`AabbTree`].
//!
//! # Stackless walk
//!
//! The walk keeps only `(node, depth)` and the running best. Starting at the
//! root it repeats:
//!
//! 1. **Evaluate**: a leaf tests its two points. An internal node whose
//!    bound is below the best distance descends to its left child and is
//!    evaluated again; otherwise it is finished (pruned).
//! 2. **Advance** a finished node: `node += 1`, then pop
//!    `min(trailing_zeros(node), depth)` levels by shifting `node` right.
//!    An odd result is the unvisited right sibling; each trailing zero marks
//!    a parent whose subtree is complete.
//! 3. **Stop** once `node` is past the live width of its depth.
//!
//! The binary counter stands in for the call stack, so a query never
//! allocates, never recurses, and only reads the frozen tree.
//!
//! # Ties
//!
//! Equidistant points resolve to whichever is found first in the walk's
//! left-biased depth-first order. The result is deterministic for a given
//! tree, not necessarily the lowest index.

use glam::Vec3;
use rayon::prelude::*;

use crate::stats::QueryStats;
use crate::tree::AabbTree;

/// Point id returned when no point could be selected (non-finite query).
pub const INVALID_POINT: u32 = u32::MAX;

/// Deepest tree a `u32`-indexed point set can produce, plus room for the root.
const MAX_STACK: usize = 34;

/// Result of a nearest-neighbor query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
  /// Index into the tree's point set.
  pub index: u32,
  /// Euclidean distance from the query.
  pub distance: f32,
}

impl AabbTree {
  /// Index of the point nearest to `query`.
  ///
  /// This is the seed the renderer starts each ray march from. Returns
  /// [`INVALID_POINT`] only for a non-finite query.
  #[inline]
  pub fn nearest_neighbor(&self, query: Vec3) -> u32 {
    self.nearest(query).map_or(INVALID_POINT, |hit| hit.index)
  }

  /// Nearest point and its distance, `None` for a non-finite query.
  pub fn nearest(&self, query: Vec3) -> Option<Nearest> {
    let mut stats = QueryStats::default();
    self.walk(query, &mut stats)
  }

  /// Same walk as [`AabbTree::nearest`], also counting visited nodes.
  pub fn nearest_with_stats(&self, query: Vec3) -> (Option<Nearest>, QueryStats) {
    let mut stats = QueryStats::default();
    let hit = self.walk(query, &mut stats);
    (hit, stats)
  }

  /// Nearest neighbor for many queries, spread over rayon's pool.
  ///
  /// Queries share the tree read-only; output order matches `queries`.
  pub fn nearest_neighbor_batch(&self, queries: &[Vec3]) -> Vec<u32> {
    queries
      .par_iter()
      .map(|query| self.nearest_neighbor(*query))
      .collect()
  }

  /// Explicit-stack walk with the same visit order as the stackless walk.
  ///
  /// The stack holds at most one pending right sibling per level and lives
  /// in a fixed array. Kept as a cross-check for the bit-arithmetic
  /// backtracking.
  pub fn nearest_neighbor_stacked(&self, query: Vec3) -> u32 {
    debug_assert!(query.is_finite(), "query must be finite");
    let layout = &self.layout;
    let leaf_depth = layout.leaf_depth();
    let positions = self.points.as_slice();

    let mut best_index = INVALID_POINT;
    let mut best_dist = f32::INFINITY;

    let mut stack = [(0usize, 0u32); MAX_STACK];
    let mut len = 1;

    while len > 0 {
      len -= 1;
      let (node, depth) = stack[len];

      if depth == leaf_depth {
        let (first, second) = layout.leaf_points(node);
        for index in [first, second] {
          let dist = positions[index].distance(query);
          if dist < best_dist {
            best_dist = dist;
            best_index = index as u32;
          }
        }
        continue;
      }

      let bound = self.nodes[layout.node_slot(depth, node)].bound(query);
      if bound < best_dist {
        let left = 2 * node;
        if left + 1 < layout.live_width(depth + 1) {
          stack[len] = (left + 1, depth + 1);
          len += 1;
        }
        stack[len] = (left, depth + 1);
        len += 1;
      }
    }

    best_index
  }

  #[inline]
  fn walk(&self, query: Vec3, stats: &mut QueryStats) -> Option<Nearest> {
    debug_assert!(query.is_finite(), "query must be finite");
    let layout = &self.layout;
    let leaf_depth = layout.leaf_depth();
    let positions = self.points.as_slice();

    let mut node = 0usize;
    let mut depth = 0u32;
    let mut best_index = INVALID_POINT;
    let mut best_dist = f32::INFINITY;

    loop {
      // Evaluate, descending along left children while the bound allows
      loop {
        if depth == leaf_depth {
          stats.leaves_visited += 1;
          let (first, second) = layout.leaf_points(node);
          for index in [first, second] {
            let dist = positions[index].distance(query);
            if dist < best_dist {
              best_dist = dist;
              best_index = index as u32;
            }
          }
          break;
        }

        stats.internal_visited += 1;
        let bound = self.nodes[layout.node_slot(depth, node)].bound(query);
        if bound < best_dist {
          node *= 2;
          depth += 1;
        } else {
          stats.pruned += 1;
          break;
        }
      }

      // Step to the next sibling, popping every completed ancestor
      node += 1;
      let step_up = node.trailing_zeros().min(depth);
      depth -= step_up;
      node >>= step_up;

      if node >= layout.live_width(depth) {
        break;
      }
    }

    (best_index != INVALID_POINT).then_some(Nearest {
      index: best_index,
      distance: best_dist,
    })
  }
}

/// Brute-force nearest neighbor by linear scan.
///
/// Ties resolve to the lowest index. `None` for an empty slice or a
/// non-finite query.
pub fn nearest_neighbor_linear(points: &[Vec3], query: Vec3) -> Option<Nearest> {
  let mut best: Option<Nearest> = None;
  for (index, point) in points.iter().enumerate() {
    let distance = point.distance(query);
    if !distance.is_nan() && best.map_or(true, |b| distance < b.distance) {
      best = Some(Nearest {
        index: index as u32,
        distance,
      });
    }
  }
  best
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
