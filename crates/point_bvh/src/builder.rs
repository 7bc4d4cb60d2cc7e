//! Level-synchronous tree construction.
//!
//! ```text
//!            ┌─────────────┐  barrier  ┌───────────────┐  barrier       ┌───────────────┐
//! PointSet ─►│ Leaf phase  ├──────────►│ Merge L-2     ├──────► .. ────►│ Merge 0 (root)│─► AabbTree
//!            │ 2^(L-1) wide│           │ 2^(L-2) wide  │                │ 1 wide        │
//!            └─────────────┘           └───────────────┘                └───────────────┘
//! ```
//!
//! 1. **Leaf phase**: leaf `i` bounds points `2i` and `2i+1` (clamped to the
//!    last point). No leaf reads another node.
//! 2. **Merge phases**: for depth `L-2` down to `0`, node `i` becomes the
//!    union of children `2i` and `2i+1` one level below.
//!
//! Nodes within a phase are independent. A phase only starts once every
//! write of the previous phase is visible, giving `L` phases in total. With a
//! single level (one or two points) only the leaf phase runs.

use std::sync::atomic::{AtomicBool, Ordering};

use web_time::Instant;

use crate::aabb::Aabb;
use crate::config::BuildConfig;
use crate::dispatch::{PhaseDispatch, RayonDispatch};
use crate::error::BuildError;
use crate::layout::{TreeLayout, MAX_POINTS};
use crate::points::PointSet;
use crate::stats::BuildStats;
use crate::tree::AabbTree;

/// Builds an [`AabbTree`] from a [`PointSet`].
///
/// The builder is the only writer of a tree's node array; what it returns is
/// frozen. Generic over the phase backend so the same protocol runs on
/// rayon or on the calling thread.
#[derive(Clone, Debug)]
pub struct TreeBuilder<D: PhaseDispatch = RayonDispatch> {
  config: BuildConfig,
  dispatch: D,
}

impl TreeBuilder<RayonDispatch> {
  /// Builder dispatching wide phases onto rayon's global pool.
  pub fn new(config: BuildConfig) -> Self {
    let dispatch = RayonDispatch::new(config.min_parallel_width);
    Self { config, dispatch }
  }
}

impl Default for TreeBuilder<RayonDispatch> {
  fn default() -> Self {
    Self::new(BuildConfig::default())
  }
}

impl<D: PhaseDispatch> TreeBuilder<D> {
  /// Builder with an explicit phase backend.
  pub fn with_dispatch(config: BuildConfig, dispatch: D) -> Self {
    Self { config, dispatch }
  }

  /// Get the build configuration.
  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  /// Get the phase backend.
  pub fn dispatch(&self) -> &D {
    &self.dispatch
  }

  /// Build a tree over `points`.
  ///
  /// # Errors
  /// [`BuildError::EmptyPointSet`] for zero points,
  /// [`BuildError::TooManyPoints`] past `u32` ids, and
  /// [`BuildError::NonFinitePoint`] when validation is enabled.
  pub fn build(&self, points: impl Into<PointSet>) -> Result<AabbTree, BuildError> {
    self.run(points.into(), None).map(|(tree, _)| tree)
  }

  /// Build a tree and report per-phase timings.
  pub fn build_timed(
    &self,
    points: impl Into<PointSet>,
  ) -> Result<(AabbTree, BuildStats), BuildError> {
    self.run(points.into(), None)
  }

  /// Build a tree, checking `cancel` at every barrier.
  ///
  /// Returns [`BuildError::Cancelled`] as soon as the flag is observed set;
  /// the partially written node array is dropped.
  pub fn build_cancellable(
    &self,
    points: impl Into<PointSet>,
    cancel: &AtomicBool,
  ) -> Result<AabbTree, BuildError> {
    self.run(points.into(), Some(cancel)).map(|(tree, _)| tree)
  }

  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "point_bvh::build"))]
  fn run(
    &self,
    points: PointSet,
    cancel: Option<&AtomicBool>,
  ) -> Result<(AabbTree, BuildStats), BuildError> {
    let start = Instant::now();

    self.validate(&points)?;
    check_cancelled(cancel)?;

    let layout = TreeLayout::new(points.len());
    let mut nodes = vec![Aabb::EMPTY; layout.storage_len()].into_boxed_slice();
    let mut stats = BuildStats::for_layout(&layout);

    #[cfg(feature = "tracing")]
    tracing::debug!(
      points = layout.point_count(),
      levels = layout.levels(),
      slots = layout.storage_len(),
      "building point tree"
    );

    // Phase A: leaves
    {
      #[cfg(feature = "tracing")]
      let _span = tracing::info_span!("leaf_phase").entered();
      let phase_start = Instant::now();

      let depth = layout.leaf_depth();
      let width = layout.level_width(depth);
      let positions = points.as_slice();
      let leaves = &mut nodes[..width];

      self.dispatch.run_phase(leaves, |leaf| {
        let (first, second) = layout.leaf_points(leaf);
        Aabb::from_points(positions[first], positions[second])
      });
      self.dispatch.barrier();

      stats.record_phase(depth, width, elapsed_us(phase_start));
    }
    check_cancelled(cancel)?;

    // Phase B: bottom-up merge, one depth per phase
    for depth in (0..layout.leaf_depth()).rev() {
      #[cfg(feature = "tracing")]
      let _span = tracing::info_span!("merge_phase", depth).entered();
      let phase_start = Instant::now();

      let width = layout.level_width(depth);
      // Children end exactly where this level begins
      let (below, above) = nodes.split_at_mut(layout.level_start(depth));
      let children: &[Aabb] = &below[layout.level_start(depth + 1)..];
      let parents = &mut above[..width];

      self
        .dispatch
        .run_phase(parents, |node| children[2 * node].union(&children[2 * node + 1]));
      self.dispatch.barrier();

      stats.record_phase(depth, width, elapsed_us(phase_start));
      check_cancelled(cancel)?;
    }

    stats.total_us = elapsed_us(start);

    #[cfg(feature = "tracing")]
    tracing::debug!(
      total_us = stats.total_us,
      phases = stats.phases.len(),
      "point tree built"
    );

    Ok((AabbTree::from_parts(points, layout, nodes), stats))
  }

  fn validate(&self, points: &PointSet) -> Result<(), BuildError> {
    let count = points.len();
    if count == 0 {
      return Err(BuildError::EmptyPointSet);
    }
    // The padding slot doubles the node count, so 2^L must be addressable too
    let levels = crate::layout::tree_levels(count);
    if count > MAX_POINTS || levels >= usize::BITS {
      return Err(BuildError::TooManyPoints { count });
    }
    if self.config.validate_points {
      if let Some(index) = points.first_non_finite() {
        return Err(BuildError::NonFinitePoint { index });
      }
    }
    Ok(())
  }
}

#[inline]
fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<(), BuildError> {
  match cancel {
    Some(flag) if flag.load(Ordering::Acquire) => Err(BuildError::Cancelled),
    _ => Ok(()),
  }
}

#[inline]
fn elapsed_us(since: Instant) -> u64 {
  since.elapsed().as_micros() as u64
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
