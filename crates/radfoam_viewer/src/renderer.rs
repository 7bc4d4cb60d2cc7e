//! Per-frame uniform preparation for the ray-march pass.
//!
//! The GPU pass itself is not part of this crate. What the CPU owes it each
//! frame is the camera pose, the intrinsics and, above all, the cell every
//! ray starts in: the scene point nearest to the camera.

use std::sync::Arc;

use glam::Vec3;
use point_bvh::{AabbTree, INVALID_POINT};

use crate::camera::FlyCamera;
use crate::config::MarchConfig;

/// Uniform block read by the ray-march shader.
///
/// Layout matches std140: the rotation is three `vec4` columns and the
/// block is padded to a multiple of 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
  /// Camera-to-world rotation, column-major, `w` unused.
  pub rotation: [[f32; 4]; 3],
  /// Camera position.
  pub translation: [f32; 3],
  pub width: u32,
  pub height: u32,
  pub focal_x: f32,
  pub focal_y: f32,
  /// Point the march starts from.
  pub start_point: u32,
  pub max_steps: u32,
  pub transmittance_threshold: f32,
  pub _padding: [u32; 2],
}

/// Number of 32-bit words in [`FrameUniforms`].
pub const UNIFORM_WORDS: usize = 24;

impl FrameUniforms {
  /// The block as 32-bit words, in upload order.
  pub fn to_words(&self) -> [u32; UNIFORM_WORDS] {
    let mut words = [0u32; UNIFORM_WORDS];
    for (column, chunk) in self.rotation.iter().zip(words.chunks_exact_mut(4)) {
      for (word, value) in chunk.iter_mut().zip(column) {
        *word = value.to_bits();
      }
    }
    for (word, value) in words[12..15].iter_mut().zip(&self.translation) {
      *word = value.to_bits();
    }
    words[15] = self.width;
    words[16] = self.height;
    words[17] = self.focal_x.to_bits();
    words[18] = self.focal_y.to_bits();
    words[19] = self.start_point;
    words[20] = self.max_steps;
    words[21] = self.transmittance_threshold.to_bits();
    words
  }
}

/// Prepares frame uniforms against a shared, immutable tree.
pub struct Renderer {
  tree: Arc<AabbTree>,
  march: MarchConfig,
  width: u32,
  height: u32,
  last_start: Option<(Vec3, u32)>,
}

impl Renderer {
  pub fn new(tree: Arc<AabbTree>, march: MarchConfig, width: u32, height: u32) -> Self {
    Self {
      tree,
      march,
      width: width.max(1),
      height: height.max(1),
      last_start: None,
    }
  }

  pub fn tree(&self) -> &Arc<AabbTree> {
    &self.tree
  }

  /// Point the march starts from for a camera at `position`.
  ///
  /// A camera that has not moved reuses the previous answer.
  pub fn start_point(&mut self, position: Vec3) -> u32 {
    if let Some((last_position, point)) = self.last_start {
      if last_position == position {
        return point;
      }
    }
    if !position.is_finite() {
      return INVALID_POINT;
    }

    let point = self.tree.nearest_neighbor(position);
    self.last_start = Some((position, point));
    point
  }

  /// Build this frame's uniform block.
  pub fn update_uniforms(&mut self, camera: &FlyCamera) -> FrameUniforms {
    let rotation = camera.rotation_matrix();
    // Square pixels: one focal length from the vertical field of view
    let focal = 0.5 * self.height as f32 / (0.5 * camera.fov_y).tan();

    FrameUniforms {
      rotation: [
        rotation.x_axis.extend(0.0).to_array(),
        rotation.y_axis.extend(0.0).to_array(),
        rotation.z_axis.extend(0.0).to_array(),
      ],
      translation: camera.position.to_array(),
      width: self.width,
      height: self.height,
      focal_x: focal,
      focal_y: focal,
      start_point: self.start_point(camera.position),
      max_steps: self.march.max_steps,
      transmittance_threshold: self.march.transmittance_threshold,
      _padding: [0; 2],
    }
  }
}
