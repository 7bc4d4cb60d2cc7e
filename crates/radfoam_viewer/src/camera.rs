//! Fly camera with per-frame movement and look steps.

use glam::{EulerRot, Mat3, Quat, Vec2, Vec3};

use crate::config::CameraConfig;

/// First-person camera.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
  pub position: Vec3,
  /// Current yaw (around +Y) in radians.
  pub yaw: f32,
  /// Current pitch (around local +X) in radians.
  pub pitch: f32,
  /// Vertical field of view in radians.
  pub fov_y: f32,
  /// Distance moved per frame at full input.
  pub move_speed: f32,
  /// Radians turned per frame at full input.
  pub rotate_speed: f32,
}

/// Input accumulated for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
  /// x = right, y = up, z = forward, each in `[-1, 1]`.
  pub move_input: Vec3,
  /// x = yaw left, y = pitch up, each in `[-1, 1]`.
  pub look_input: Vec2,
}

impl CameraInput {
  /// Hold the forward key for one frame.
  pub fn forward() -> Self {
    Self {
      move_input: Vec3::Z,
      ..Default::default()
    }
  }
}

/// Pitch stays short of straight up/down.
const PITCH_LIMIT: f32 = 1.5;

impl FlyCamera {
  pub fn from_config(config: &CameraConfig) -> Self {
    Self {
      position: Vec3::from_array(config.position),
      yaw: config.yaw_degrees.to_radians(),
      pitch: config.pitch_degrees.to_radians().clamp(-PITCH_LIMIT, PITCH_LIMIT),
      fov_y: config.fov_y_degrees.to_radians(),
      move_speed: config.move_speed,
      rotate_speed: config.rotate_speed_degrees.to_radians(),
    }
  }

  /// Camera orientation (YXZ euler order).
  pub fn rotation(&self) -> Quat {
    Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
  }

  /// Camera-to-world rotation matrix.
  pub fn rotation_matrix(&self) -> Mat3 {
    Mat3::from_quat(self.rotation())
  }

  /// View direction (`-Z` in camera space).
  pub fn forward(&self) -> Vec3 {
    self.rotation() * Vec3::NEG_Z
  }

  pub fn right(&self) -> Vec3 {
    self.rotation() * Vec3::X
  }

  /// Apply one frame of input: look first, then move in the new frame.
  pub fn apply(&mut self, input: CameraInput) {
    let look = input.look_input.clamp(Vec2::NEG_ONE, Vec2::ONE);
    self.yaw += look.x * self.rotate_speed;
    self.pitch = (self.pitch + look.y * self.rotate_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);

    let movement = input.move_input.clamp(Vec3::NEG_ONE, Vec3::ONE);
    let velocity = self.right() * movement.x + Vec3::Y * movement.y + self.forward() * movement.z;
    if velocity.length_squared() > 0.0 {
      self.position += velocity.normalize() * self.move_speed;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn camera() -> FlyCamera {
    FlyCamera::from_config(&CameraConfig {
      position: [0.0, 0.0, 0.0],
      ..Default::default()
    })
  }

  #[test]
  fn test_from_config_defaults() {
    let camera = FlyCamera::from_config(&CameraConfig::default());
    assert_eq!(camera.position, Vec3::new(-3.162_920_7, -0.648_326_9, -0.170_250_22));
    assert!((camera.fov_y - 60f32.to_radians()).abs() < 1e-6);
    assert!((camera.rotate_speed - 1f32.to_radians()).abs() < 1e-6);
  }

  #[test]
  fn test_default_looks_down_negative_z() {
    let camera = camera();
    assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
    assert!(camera.right().abs_diff_eq(Vec3::X, 1e-6));
  }

  #[test]
  fn test_forward_step_moves_by_speed() {
    let mut camera = camera();
    camera.apply(CameraInput::forward());
    assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, -0.05), 1e-6));
  }

  #[test]
  fn test_diagonal_move_is_normalized() {
    let mut camera = camera();
    camera.apply(CameraInput {
      move_input: Vec3::new(1.0, 0.0, 1.0),
      ..Default::default()
    });
    assert!((camera.position.length() - camera.move_speed).abs() < 1e-6);
  }

  #[test]
  fn test_yaw_turns_forward() {
    let mut camera = camera();
    camera.rotate_speed = std::f32::consts::FRAC_PI_2;
    camera.apply(CameraInput {
      look_input: Vec2::new(1.0, 0.0),
      ..Default::default()
    });
    // Quarter turn left around +Y
    assert!(camera.forward().abs_diff_eq(Vec3::NEG_X, 1e-5));
  }

  #[test]
  fn test_pitch_is_clamped() {
    let mut camera = camera();
    camera.rotate_speed = 1.0;
    for _ in 0..5 {
      camera.apply(CameraInput {
        look_input: Vec2::new(0.0, 1.0),
        ..Default::default()
      });
    }
    assert_eq!(camera.pitch, PITCH_LIMIT);
  }

  #[test]
  fn test_rotation_matrix_is_orthonormal() {
    let mut camera = camera();
    camera.yaw = 0.7;
    camera.pitch = -0.3;
    let m = camera.rotation_matrix();
    assert!((m.determinant() - 1.0).abs() < 1e-5);
    assert!((m * m.transpose()).abs_diff_eq(Mat3::IDENTITY, 1e-5));
  }
}
