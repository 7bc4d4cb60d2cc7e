//! Background tree builds on rayon's pool.
//!
//! A viewer that loads a new scene cannot block its frame loop on a full
//! build. [`BuildExecutor`] queues the build with `rayon::spawn` and hands
//! back a [`BuildId`] to poll each frame:
//!
//! ```ignore
//! let executor = BuildExecutor::new(BuildConfig::default());
//! let id = executor.spawn(points);
//!
//! // Later, once per frame
//! if let Some(result) = executor.poll(id) {
//!     let tree = result?;
//! }
//! ```
//!
//! Each build carries its own cancel flag, checked by the builder at every
//! phase barrier.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::builder::TreeBuilder;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::points::PointSet;
use crate::tree::AabbTree;

/// Unique identifier for a queued build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuildId(u64);

impl BuildId {
  fn next() -> Self {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    Self(COUNTER.fetch_add(1, Ordering::Relaxed))
  }
}

type BuildResult = Result<AabbTree, BuildError>;

/// Runs tree builds on rayon's pool and collects their results.
///
/// Clones share the same result table, so a build spawned from one handle
/// can be polled from another.
#[derive(Clone)]
pub struct BuildExecutor {
  config: BuildConfig,
  /// Finished builds waiting to be polled.
  results: Arc<Mutex<HashMap<BuildId, BuildResult>>>,
  /// Queued or running builds and their cancel flags.
  pending: Arc<Mutex<HashMap<BuildId, Arc<AtomicBool>>>>,
}

impl BuildExecutor {
  /// Executor whose builds use `config`.
  pub fn new(config: BuildConfig) -> Self {
    Self {
      config,
      results: Arc::new(Mutex::new(HashMap::new())),
      pending: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Get the configuration builds run with.
  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  /// Queue a build over `points` (non-blocking).
  pub fn spawn(&self, points: impl Into<PointSet>) -> BuildId {
    let id = BuildId::next();
    let points = points.into();
    let cancel = Arc::new(AtomicBool::new(false));

    lock(&self.pending).insert(id, Arc::clone(&cancel));

    let builder = TreeBuilder::new(self.config.clone());
    let results = Arc::clone(&self.results);
    let pending = Arc::clone(&self.pending);

    rayon::spawn(move || {
      let result = builder.build_cancellable(points, &cancel);

      #[cfg(feature = "tracing")]
      if let Err(err) = &result {
        tracing::debug!(build = id.0, %err, "background build finished without a tree");
      }

      // Leave the pending table first so a polled result is never still pending
      lock(&pending).remove(&id);
      lock(&results).insert(id, result);
    });

    id
  }

  /// Take a finished build's result (non-blocking).
  ///
  /// `None` while the build is still running, and for unknown or already
  /// consumed ids.
  pub fn poll(&self, id: BuildId) -> Option<BuildResult> {
    lock(&self.results).remove(&id)
  }

  /// Ask a running build to stop at its next phase barrier.
  ///
  /// Returns `false` if the build already finished. A cancelled build still
  /// produces a result, normally [`BuildError::Cancelled`], unless it got past
  /// its last barrier first.
  pub fn cancel(&self, id: BuildId) -> bool {
    match lock(&self.pending).get(&id) {
      Some(flag) => {
        flag.store(true, Ordering::Release);
        true
      }
      None => false,
    }
  }

  /// Check if a build is still queued or running.
  pub fn is_pending(&self, id: BuildId) -> bool {
    lock(&self.pending).contains_key(&id)
  }

  /// Number of builds currently queued or running.
  pub fn pending_count(&self) -> usize {
    lock(&self.pending).len()
  }

  /// Number of worker threads in rayon's pool.
  pub fn num_threads(&self) -> usize {
    rayon::current_num_threads()
  }
}

impl Default for BuildExecutor {
  fn default() -> Self {
    Self::new(BuildConfig::default())
  }
}

/// The tables stay consistent even if a holder panicked, so poisoning is
/// ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Tests
// =============================================================================
