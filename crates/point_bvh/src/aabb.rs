//! Axis-aligned bounding box used for every node of the tree.

use glam::Vec3;

/// Outside distance at or below which a query counts as inside a box.
pub const INSIDE_EPSILON: f32 = 1e-6;

/// Axis-aligned bounding box.
///
/// Leaves bound one or two points; internal nodes are the exact union of
/// their two children.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
  /// Minimum corner (inclusive).
  pub min: Vec3,
  /// Maximum corner (inclusive).
  pub max: Vec3,
}

impl Aabb {
  /// Inverted box, the identity of [`Aabb::union`].
  ///
  /// Also marks the padding slot at the end of the node array.
  pub const EMPTY: Self = Self {
    min: Vec3::INFINITY,
    max: Vec3::NEG_INFINITY,
  };

  /// Create an AABB from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(
      min.cmple(max).all(),
      "AABB min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Degenerate box around a single point (`min == max`).
  #[inline]
  pub fn from_point(point: Vec3) -> Self {
    Self {
      min: point,
      max: point,
    }
  }

  /// Smallest box containing both points.
  #[inline]
  pub fn from_points(a: Vec3, b: Vec3) -> Self {
    Self {
      min: a.min(b),
      max: a.max(b),
    }
  }

  /// Component-wise union: min of mins, max of maxes.
  #[inline]
  pub fn union(&self, other: &Aabb) -> Aabb {
    Aabb {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Expand the box to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Check if the box is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min.cmple(self.max).all()
  }

  /// Check if the box contains a point (boundary inclusive).
  #[inline]
  pub fn contains_point(&self, point: Vec3) -> bool {
    point.cmpge(self.min).all() && point.cmple(self.max).all()
  }

  /// Containment with a tolerance on every face.
  #[inline]
  pub fn contains_point_within(&self, point: Vec3, tolerance: f32) -> bool {
    let slack = Vec3::splat(tolerance);
    point.cmpge(self.min - slack).all() && point.cmple(self.max + slack).all()
  }

  /// Euclidean distance from `point` to the box, 0 when inside.
  ///
  /// Infinite for [`Aabb::EMPTY`].
  #[inline]
  pub fn distance_to_point(&self, point: Vec3) -> f32 {
    (self.min - point)
      .max(point - self.max)
      .max(Vec3::ZERO)
      .length()
  }

  /// Distance from an inside `point` to the nearest face.
  ///
  /// Negative when the point lies outside along some axis.
  #[inline]
  pub fn distance_to_nearest_face(&self, point: Vec3) -> f32 {
    (self.max - point).min(point - self.min).min_element()
  }

  /// Lower bound on the distance from `point` to anything inside the box.
  ///
  /// Positive outside distance when the point is clearly outside; otherwise
  /// the negated distance to the nearest face. A negative bound never prunes.
  #[inline]
  pub fn bound(&self, point: Vec3) -> f32 {
    let outside = self.distance_to_point(point);
    if outside > INSIDE_EPSILON {
      outside
    } else {
      -self.distance_to_nearest_face(point)
    }
  }

  /// Size of the box (max - min).
  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  /// Center of the box.
  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }
}

impl Default for Aabb {
  fn default() -> Self {
    Self::EMPTY
  }
}

#[cfg(test)]
#[path = "aabb_test.rs"]
mod aabb_test;
