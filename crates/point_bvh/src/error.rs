//! Error types for tree construction and verification.

use thiserror::Error;

/// Reasons a build can fail. A failed build never yields a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The tree needs at least one point.
  #[error("cannot build a tree over an empty point set")]
  EmptyPointSet,

  /// Point ids must fit in `u32`.
  #[error("point set has {count} points, more than the {max} a tree can index", max = crate::MAX_POINTS)]
  TooManyPoints { count: usize },

  /// A coordinate is NaN or infinite.
  #[error("point {index} has a non-finite coordinate")]
  NonFinitePoint { index: usize },

  /// The build was cancelled between phases.
  #[error("tree build was cancelled")]
  Cancelled,
}

/// First broken invariant found by [`AabbTree::verify`](crate::AabbTree::verify).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
  #[error("node array holds {actual} boxes, expected {expected}")]
  WrongStorageLen { expected: usize, actual: usize },

  #[error("leaf {leaf} does not bound exactly its two points")]
  LeafMismatch { leaf: usize },

  #[error("node {node} at depth {depth} is not the union of its children")]
  UnionMismatch { depth: u32, node: usize },

  #[error("point {index} lies outside the root box")]
  PointOutsideRoot { index: usize },
}
