//! BuildConfig - knobs for tree construction.

/// Configuration for [`TreeBuilder`](crate::TreeBuilder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
  /// Reject point sets containing NaN or infinite coordinates.
  ///
  /// A non-finite point poisons every box above it and breaks the exactness
  /// of the nearest-neighbor walk.
  pub validate_points: bool,

  /// Phases narrower than this run on the calling thread even when the
  /// parallel dispatcher is used. The top levels of the tree hold only a
  /// handful of nodes.
  pub min_parallel_width: usize,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      validate_points: true,
      min_parallel_width: 1024,
    }
  }
}

impl BuildConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_validate_points(mut self, validate: bool) -> Self {
    self.validate_points = validate;
    self
  }

  pub fn with_min_parallel_width(mut self, width: usize) -> Self {
    self.min_parallel_width = width;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_build_config_builder() {
    let config = BuildConfig::new()
      .with_validate_points(false)
      .with_min_parallel_width(1);

    assert!(!config.validate_points);
    assert_eq!(config.min_parallel_width, 1);
  }

  #[test]
  fn test_defaults() {
    let config = BuildConfig::default();
    assert!(config.validate_points);
    assert_eq!(config.min_parallel_width, 1024);
  }
}
