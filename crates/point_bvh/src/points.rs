//! PointSet - the ordered, immutable point positions the tree indexes.

use std::ops::Index;
use std::sync::Arc;

use glam::Vec3;

/// Ordered, immutable array of point positions.
///
/// The index into this array is the point identifier returned by queries.
/// Cloning is cheap; clones share the same positions.
#[derive(Clone, Debug, PartialEq)]
pub struct PointSet {
  positions: Arc<[Vec3]>,
}

impl PointSet {
  /// Wrap a list of positions.
  pub fn new(positions: impl Into<Arc<[Vec3]>>) -> Self {
    Self {
      positions: positions.into(),
    }
  }

  /// Number of points.
  #[inline]
  pub fn len(&self) -> usize {
    self.positions.len()
  }

  /// Check if empty.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  /// Position of point `index`.
  #[inline]
  pub fn get(&self, index: usize) -> Option<Vec3> {
    self.positions.get(index).copied()
  }

  /// All positions in id order.
  #[inline]
  pub fn as_slice(&self) -> &[Vec3] {
    &self.positions
  }

  /// Iterate over positions in id order.
  pub fn iter(&self) -> impl Iterator<Item = Vec3> + '_ {
    self.positions.iter().copied()
  }

  /// Index of the first point with a NaN or infinite coordinate.
  pub fn first_non_finite(&self) -> Option<usize> {
    self.positions.iter().position(|p| !p.is_finite())
  }
}

impl Index<usize> for PointSet {
  type Output = Vec3;

  #[inline]
  fn index(&self, index: usize) -> &Vec3 {
    &self.positions[index]
  }
}

impl From<Vec<Vec3>> for PointSet {
  fn from(positions: Vec<Vec3>) -> Self {
    Self::new(positions)
  }
}

impl From<&[Vec3]> for PointSet {
  fn from(positions: &[Vec3]) -> Self {
    Self::new(positions)
  }
}

impl From<Arc<[Vec3]>> for PointSet {
  fn from(positions: Arc<[Vec3]>) -> Self {
    Self { positions }
  }
}

impl From<Vec<[f32; 3]>> for PointSet {
  fn from(positions: Vec<[f32; 3]>) -> Self {
    positions.into_iter().map(Vec3::from_array).collect()
  }
}

impl FromIterator<Vec3> for PointSet {
  fn from_iter<I: IntoIterator<Item = Vec3>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect::<Vec<_>>())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_clones_share_positions() {
    let points = PointSet::from(vec![Vec3::ZERO, Vec3::ONE]);
    let clone = points.clone();
    assert!(std::ptr::eq(points.as_slice(), clone.as_slice()));
    assert_eq!(clone.len(), 2);
  }

  #[test]
  fn test_from_arrays() {
    let points = PointSet::from(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    assert_eq!(points[1], Vec3::new(4.0, 5.0, 6.0));
    assert_eq!(points.get(2), None);
  }

  #[test]
  fn test_first_non_finite() {
    let points = PointSet::from(vec![Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ONE]);
    assert_eq!(points.first_non_finite(), Some(1));

    let finite = PointSet::from(vec![Vec3::ZERO, Vec3::ONE]);
    assert_eq!(finite.first_non_finite(), None);
  }
}
