//! Phase execution for the level-synchronous build.
//!
//! The builder only needs two primitives from its execution backend:
//!
//! - run a kernel over `K` independent indices, writing one box per index
//! - a full barrier, after which every write of the phase is visible
//!
//! [`RayonDispatch`] maps a phase onto rayon's pool (native threads, or Web
//! Workers via wasm-bindgen-rayon). [`SerialDispatch`] runs the same phases on
//! the calling thread and serves as the reference backend.

use std::sync::atomic::{fence, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::aabb::Aabb;

/// Backend that executes one build phase at a time.
pub trait PhaseDispatch: Sync {
  /// Run `kernel(i)` for every `i` in `0..out.len()`, storing into `out[i]`.
  ///
  /// Indices are independent; the backend may run them in any order and on
  /// any thread. Every slot is written exactly once.
  fn run_phase<F>(&self, out: &mut [Aabb], kernel: F)
  where
    F: Fn(usize) -> Aabb + Sync;

  /// Full barrier between phases.
  ///
  /// `run_phase` on the CPU backends already joins its workers before
  /// returning; the fence makes the ordering explicit for callers that hand
  /// the storage to another thread.
  fn barrier(&self) {
    fence(Ordering::SeqCst);
  }
}

/// Runs every phase sequentially on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialDispatch;

impl PhaseDispatch for SerialDispatch {
  fn run_phase<F>(&self, out: &mut [Aabb], kernel: F)
  where
    F: Fn(usize) -> Aabb + Sync,
  {
    for (index, slot) in out.iter_mut().enumerate() {
      *slot = kernel(index);
    }
  }
}

/// Runs wide phases on rayon's thread pool.
///
/// Phases narrower than `min_parallel_width` fall back to the calling thread.
#[derive(Clone, Debug)]
pub struct RayonDispatch {
  min_parallel_width: usize,
  pool: Option<Arc<ThreadPool>>,
}

impl RayonDispatch {
  /// Dispatch onto rayon's global pool.
  pub fn new(min_parallel_width: usize) -> Self {
    Self {
      min_parallel_width,
      pool: None,
    }
  }

  /// Dispatch onto a dedicated pool instead of the global one.
  pub fn with_pool(min_parallel_width: usize, pool: Arc<ThreadPool>) -> Self {
    Self {
      min_parallel_width,
      pool: Some(pool),
    }
  }

  /// Get the number of worker threads phases are spread across.
  pub fn num_threads(&self) -> usize {
    match &self.pool {
      Some(pool) => pool.current_num_threads(),
      None => rayon::current_num_threads(),
    }
  }
}

impl Default for RayonDispatch {
  fn default() -> Self {
    Self::new(crate::BuildConfig::default().min_parallel_width)
  }
}

impl PhaseDispatch for RayonDispatch {
  fn run_phase<F>(&self, out: &mut [Aabb], kernel: F)
  where
    F: Fn(usize) -> Aabb + Sync,
  {
    if out.len() < self.min_parallel_width {
      SerialDispatch.run_phase(out, kernel);
      return;
    }

    match &self.pool {
      Some(pool) => pool.install(|| fill_parallel(out, &kernel)),
      None => fill_parallel(out, &kernel),
    }
  }
}

fn fill_parallel<F>(out: &mut [Aabb], kernel: &F)
where
  F: Fn(usize) -> Aabb + Sync,
{
  out
    .par_iter_mut()
    .enumerate()
    .for_each(|(index, slot)| *slot = kernel(index));
}
