//! Error types for scene loading.

use thiserror::Error;

/// Reasons a scene file cannot be loaded or written.
#[derive(Debug, Error)]
pub enum SceneError {
  #[error("scene I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid PLY header at line {line}: {reason}")]
  InvalidHeader { line: usize, reason: String },

  #[error("unsupported PLY format `{0}`")]
  UnsupportedFormat(String),

  /// A radiance-foam scene needs both `vertex` and `adjacency` elements.
  #[error("PLY file is not complete: no `{0}` element")]
  MissingElement(&'static str),

  #[error("element `{element}` has no `{property}` property")]
  MissingProperty { element: String, property: String },

  #[error("list property `{property}` of element `{element}` is not supported")]
  ListProperty { element: String, property: String },

  #[error("element `{element}` row {row}: {reason}")]
  BadRow {
    element: String,
    row: usize,
    reason: String,
  },

  /// Offsets are end offsets into the adjacency list and must not decrease.
  #[error("vertex {vertex} has adjacency offset {offset}, outside {previous}..={len}")]
  BadAdjacencyOffset {
    vertex: usize,
    offset: u32,
    previous: u32,
    len: usize,
  },

  #[error("adjacency entry {entry} names vertex {neighbor}, but the scene has {vertex_count}")]
  BadNeighbor {
    entry: usize,
    neighbor: u32,
    vertex_count: usize,
  },
}
