//! Point fixtures shared by the tree tests.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Four points from the worked example: a horizontal pair and a vertical
/// pair crossing at x = 5.
pub fn cross_points() -> Vec<Vec3> {
  vec![
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(10.0, 0.0, 0.0),
    Vec3::new(5.0, 5.0, 0.0),
    Vec3::new(5.0, -5.0, 0.0),
  ]
}

/// `count` points spread uniformly over `[-extent, extent]^3`.
pub fn random_points(seed: u64, count: usize, extent: f32) -> Vec<Vec3> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..count).map(|_| random_point(&mut rng, extent)).collect()
}

/// `count` points packed in a few tight clusters, the layout a trained
/// radiance foam tends to have near surfaces.
pub fn clustered_points(seed: u64, count: usize, clusters: usize) -> Vec<Vec3> {
  let mut rng = StdRng::seed_from_u64(seed);
  let centers: Vec<Vec3> = (0..clusters.max(1))
    .map(|_| random_point(&mut rng, 50.0))
    .collect();
  (0..count)
    .map(|i| centers[i % centers.len()] + random_point(&mut rng, 0.5))
    .collect()
}

/// Integer lattice points, which produce many exact distance ties.
pub fn grid_points(side: usize) -> Vec<Vec3> {
  let mut points = Vec::with_capacity(side * side * side);
  for x in 0..side {
    for y in 0..side {
      for z in 0..side {
        points.push(Vec3::new(x as f32, y as f32, z as f32));
      }
    }
  }
  points
}

/// `count` query positions over `[-extent, extent]^3`.
pub fn random_queries(seed: u64, count: usize, extent: f32) -> Vec<Vec3> {
  random_points(seed ^ 0x5EED_0F_0E1D, count, extent)
}

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
  Vec3::new(
    rng.random_range(-extent..=extent),
    rng.random_range(-extent..=extent),
    rng.random_range(-extent..=extent),
  )
}
