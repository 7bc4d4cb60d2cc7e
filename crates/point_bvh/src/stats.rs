//! Statistics from tree builds and queries.

use crate::layout::TreeLayout;

/// Timing for one barrier-separated build phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStats {
  /// Depth written by this phase (`L-1` for the leaf phase).
  pub depth: u32,
  /// Number of nodes dispatched.
  pub width: usize,
  /// Wall time in microseconds, including the barrier.
  pub elapsed_us: u64,
}

/// Statistics from one tree build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
  /// Number of points indexed.
  pub point_count: usize,
  /// Tree levels `L`.
  pub levels: u32,
  /// Phases in execution order: leaf phase first, root merge last.
  pub phases: Vec<PhaseStats>,
  /// Total build time in microseconds (validation, allocation and phases).
  pub total_us: u64,
}

impl BuildStats {
  pub(crate) fn for_layout(layout: &TreeLayout) -> Self {
    Self {
      point_count: layout.point_count(),
      levels: layout.levels(),
      phases: Vec::with_capacity(layout.levels() as usize),
      total_us: 0,
    }
  }

  pub(crate) fn record_phase(&mut self, depth: u32, width: usize, elapsed_us: u64) {
    self.phases.push(PhaseStats {
      depth,
      width,
      elapsed_us,
    });
  }

  /// Number of nodes written across all phases.
  pub fn nodes_written(&self) -> usize {
    self.phases.iter().map(|p| p.width).sum()
  }

  /// Sum of per-phase times in microseconds.
  pub fn phase_us(&self) -> u64 {
    self.phases.iter().map(|p| p.elapsed_us).sum()
  }
}

/// Work done by one nearest-neighbor query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
  /// Internal nodes whose bound was evaluated.
  pub internal_visited: u32,
  /// Leaves whose points were tested.
  pub leaves_visited: u32,
  /// Internal nodes rejected by their bound.
  pub pruned: u32,
}

impl QueryStats {
  /// Number of point distances computed (two per leaf).
  pub fn distance_tests(&self) -> u64 {
    u64::from(self.leaves_visited) * 2
  }
}
