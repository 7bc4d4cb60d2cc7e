//! point_bvh - Implicit AABB tree over an immutable point cloud
//!
//! This crate provides the spatial index a point-based radiance-field viewer
//! uses to seed its ray march: given an arbitrary query position (usually the
//! camera), find the point of the cloud closest to it.
//!
//! # Features
//!
//! - **Implicit layout**: one flat array of `2^L` boxes, no per-node
//!   allocation; node adjacency is pure index arithmetic
//! - **Level-synchronous build**: leaves first, then one merge phase per
//!   depth, each phase fully parallel and separated by a barrier
//! - **Stackless nearest neighbor**: branch-and-bound walk that backtracks
//!   with a trailing-zero count instead of a stack; no recursion, no heap
//! - **Background builds**: rebuilds can run on the rayon pool and be polled
//!   or cancelled between phases
//!
//! # Example
//!
//! ```ignore
//! use glam::Vec3;
//! use point_bvh::AabbTree;
//!
//! let tree = AabbTree::build(vec![
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(10.0, 0.0, 0.0),
//!     Vec3::new(5.0, 5.0, 0.0),
//!     Vec3::new(5.0, -5.0, 0.0),
//! ])?;
//!
//! assert_eq!(tree.nearest_neighbor(Vec3::new(6.0, 0.0, 0.0)), 1);
//! ```

pub mod aabb;
pub mod config;
pub mod error;
pub mod layout;
pub mod points;

// Re-export commonly used items
pub use aabb::{Aabb, INSIDE_EPSILON};
pub use config::BuildConfig;
pub use error::{BuildError, InvariantViolation};
pub use layout::{TreeLayout, MAX_POINTS};
pub use points::PointSet;

// Phase execution (parallel kernel + barrier)
pub mod dispatch;
pub use dispatch::{PhaseDispatch, RayonDispatch, SerialDispatch};

// Level-synchronous construction
pub mod builder;
pub use builder::TreeBuilder;

// Built tree and its queries
pub mod query;
pub mod tree;
pub use query::{nearest_neighbor_linear, Nearest, INVALID_POINT};
pub use tree::AabbTree;

// Build/query statistics
pub mod stats;
pub use stats::{BuildStats, PhaseStats, QueryStats};

// Background builds on the rayon pool
pub mod executor;
pub use executor::{BuildExecutor, BuildId};

#[cfg(test)]
pub mod test_utils;
