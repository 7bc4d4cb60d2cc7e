//! Viewer configuration, read from an optional TOML file.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```toml
//! [camera]
//! position = [-3.16, -0.65, -0.17]
//! fov_y_degrees = 50.0
//!
//! [march]
//! max_steps = 2000
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use point_bvh::BuildConfig;
use serde::Deserialize;

/// Root viewer configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
  pub camera: CameraConfig,
  pub march: MarchConfig,
  pub build: BuildSettings,
}

/// Initial camera pose and controls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
  /// World-space start position.
  pub position: [f32; 3],
  pub yaw_degrees: f32,
  pub pitch_degrees: f32,
  /// Vertical field of view.
  pub fov_y_degrees: f32,
  /// Distance moved per frame while a movement key is held.
  pub move_speed: f32,
  /// Rotation per frame while a look key is held.
  pub rotate_speed_degrees: f32,
}

impl Default for CameraConfig {
  fn default() -> Self {
    Self {
      position: [-3.162_920_7, -0.648_326_9, -0.170_250_22],
      yaw_degrees: 0.0,
      pitch_degrees: 0.0,
      fov_y_degrees: 60.0,
      move_speed: 0.05,
      rotate_speed_degrees: 1.0,
    }
  }
}

/// Ray-march limits handed to the renderer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarchConfig {
  /// Cells a ray may cross before it stops.
  pub max_steps: u32,
  /// A ray stops once its remaining transmittance falls below this.
  pub transmittance_threshold: f32,
}

impl Default for MarchConfig {
  fn default() -> Self {
    Self {
      max_steps: 1000,
      transmittance_threshold: 0.01,
    }
  }
}

/// Tree build settings, mirrored onto [`BuildConfig`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
  pub validate_points: bool,
  pub min_parallel_width: usize,
}

impl Default for BuildSettings {
  fn default() -> Self {
    let build = BuildConfig::default();
    Self {
      validate_points: build.validate_points,
      min_parallel_width: build.min_parallel_width,
    }
  }
}

impl BuildSettings {
  pub fn to_build_config(&self) -> BuildConfig {
    BuildConfig::new()
      .with_validate_points(self.validate_points)
      .with_min_parallel_width(self.min_parallel_width)
  }
}

impl ViewerConfig {
  /// Load configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    Self::from_toml_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
  }

  /// Parse and validate configuration from TOML text.
  pub fn from_toml_str(content: &str) -> Result<Self> {
    let config: ViewerConfig = toml::from_str(content).context("Failed to parse config TOML")?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    let camera = &self.camera;
    if !camera.position.iter().all(|c| c.is_finite()) {
      anyhow::bail!("camera.position must be finite, got {:?}", camera.position);
    }
    if !(camera.fov_y_degrees > 0.0 && camera.fov_y_degrees < 180.0) {
      anyhow::bail!(
        "camera.fov_y_degrees must be in (0, 180), got {}",
        camera.fov_y_degrees
      );
    }
    if self.march.max_steps == 0 {
      anyhow::bail!("march.max_steps must be at least 1");
    }
    let threshold = self.march.transmittance_threshold;
    if !(threshold > 0.0 && threshold < 1.0) {
      anyhow::bail!(
        "march.transmittance_threshold must be in (0, 1), got {}",
        threshold
      );
    }
    if self.build.min_parallel_width == 0 {
      anyhow::bail!("build.min_parallel_width must be at least 1");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_gives_defaults() {
    let config = ViewerConfig::from_toml_str("").unwrap();
    assert_eq!(config, ViewerConfig::default());
    assert_eq!(config.march.max_steps, 1000);
    assert_eq!(config.build.to_build_config(), BuildConfig::default());
  }

  #[test]
  fn test_partial_override() {
    let config = ViewerConfig::from_toml_str(
      r#"
        [camera]
        position = [1.0, 2.0, 3.0]

        [march]
        max_steps = 64
      "#,
    )
    .unwrap();

    assert_eq!(config.camera.position, [1.0, 2.0, 3.0]);
    assert_eq!(config.camera.fov_y_degrees, 60.0);
    assert_eq!(config.march.max_steps, 64);
    assert_eq!(config.march.transmittance_threshold, 0.01);
  }

  #[test]
  fn test_rejects_bad_values() {
    assert!(ViewerConfig::from_toml_str("[march]\nmax_steps = 0").is_err());
    assert!(ViewerConfig::from_toml_str("[march]\ntransmittance_threshold = 1.5").is_err());
    assert!(ViewerConfig::from_toml_str("[camera]\nfov_y_degrees = 180.0").is_err());
    assert!(ViewerConfig::from_toml_str("[build]\nmin_parallel_width = 0").is_err());
  }

  #[test]
  fn test_rejects_unknown_keys() {
    assert!(ViewerConfig::from_toml_str("[camera]\nzoom = 2.0").is_err());
  }

  #[test]
  fn test_load_missing_file() {
    let err = ViewerConfig::load(Path::new("/nonexistent/viewer.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
  }
}
