use std::sync::Arc;

use super::*;
use crate::BuildConfig;
use crate::test_utils::{cross_points, random_points};

#[test]
fn test_tree_is_send_sync() {
  fn assert_send_sync<T: Send + Sync>() {}
  assert_send_sync::<AabbTree>();
  assert_send_sync::<Arc<AabbTree>>();
}

#[test]
fn test_accessors() {
  let tree = AabbTree::build(cross_points()).unwrap();

  assert_eq!(tree.point_count(), 4);
  assert_eq!(tree.points().len(), 4);
  assert_eq!(tree.levels(), 2);
  assert_eq!(tree.layout().storage_len(), 4);
  assert_eq!(tree.point(2), Some(Vec3::new(5.0, 5.0, 0.0)));
  assert_eq!(tree.point(4), None);
  assert_eq!(tree.level(0), std::slice::from_ref(tree.root()));
  assert_eq!(tree.level(1).len(), 2);
}

#[test]
fn test_level_slices_tile_node_array() {
  let tree = AabbTree::build(random_points(1, 100, 1.0)).unwrap();
  let total: usize = (0..tree.levels()).map(|d| tree.level(d).len()).sum();
  assert_eq!(total + 1, tree.nodes().len());
}

#[test]
fn test_node_memory_bytes() {
  let tree = AabbTree::build(random_points(2, 1000, 1.0)).unwrap();
  assert_eq!(
    tree.node_memory_bytes(),
    1024 * std::mem::size_of::<Aabb>()
  );
  assert_eq!(std::mem::size_of::<Aabb>(), 24);
}

#[test]
fn test_clone_shares_points() {
  let tree = AabbTree::build(random_points(3, 10, 1.0)).unwrap();
  let clone = tree.clone();
  assert!(std::ptr::eq(tree.points().as_slice(), clone.points().as_slice()));
  assert_eq!(tree.nodes(), clone.nodes());
}

// =========================================================================
// verify() catches corruption
// =========================================================================

#[test]
fn test_verify_detects_bad_internal_node() {
  let mut tree = AabbTree::build(random_points(4, 64, 1.0)).unwrap();
  let slot = tree.layout.node_slot(2, 1);
  tree.nodes[slot].max += Vec3::splat(0.5);

  assert_eq!(
    tree.verify(),
    Err(InvariantViolation::UnionMismatch { depth: 1, node: 0 })
  );
}

#[test]
fn test_verify_detects_bad_leaf() {
  let mut tree = AabbTree::build(random_points(5, 64, 1.0)).unwrap();
  let slot = tree.layout.node_slot(tree.layout.leaf_depth(), 7);
  tree.nodes[slot].min -= Vec3::X;

  assert_eq!(tree.verify(), Err(InvariantViolation::LeafMismatch { leaf: 7 }));
}

#[test]
fn test_verify_detects_wrong_storage_len() {
  let mut tree = AabbTree::build(random_points(6, 8, 1.0)).unwrap();
  tree.nodes = vec![Aabb::EMPTY; 4].into_boxed_slice();

  assert_eq!(
    tree.verify(),
    Err(InvariantViolation::WrongStorageLen {
      expected: 8,
      actual: 4
    })
  );
}

#[test]
fn test_verify_detects_swapped_points() {
  // Points the nodes were not built from
  let mut tree = AabbTree::build(vec![Vec3::ZERO, Vec3::ONE]).unwrap();
  tree.points = PointSet::from(vec![Vec3::ZERO, Vec3::splat(2.0)]);

  assert_eq!(tree.verify(), Err(InvariantViolation::LeafMismatch { leaf: 0 }));
}

#[test]
fn test_verify_detects_nan_point() {
  // Paired with a finite point, min/max drop the NaN and the leaf still matches
  let builder = TreeBuilder::new(BuildConfig::default().with_validate_points(false));
  let tree = builder
    .build(vec![Vec3::ZERO, Vec3::new(f32::NAN, 0.5, 0.5), Vec3::ONE])
    .unwrap();

  assert_eq!(tree.verify(), Err(InvariantViolation::PointOutsideRoot { index: 1 }));
}
