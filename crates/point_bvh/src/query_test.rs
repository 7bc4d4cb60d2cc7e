use std::sync::Arc;

use super::*;
use crate::test_utils::{clustered_points, cross_points, grid_points, random_points, random_queries};
use crate::{BuildConfig, SerialDispatch, TreeBuilder};

/// Tree answer must be at exactly the brute-force minimum distance. The
/// index may differ only on a tie.
fn assert_matches_linear(tree: &AabbTree, queries: &[Vec3]) {
  let points = tree.points().as_slice();
  for query in queries {
    let hit = tree.nearest(*query).expect("finite query has a nearest point");
    let expected = nearest_neighbor_linear(points, *query).expect("non-empty point set");

    assert_eq!(
      hit.distance, expected.distance,
      "N={} query={:?}: tree picked {} at {}, linear picked {} at {}",
      points.len(),
      query,
      hit.index,
      hit.distance,
      expected.index,
      expected.distance
    );
    assert_eq!(points[hit.index as usize].distance(*query), hit.distance);
  }
}

// =========================================================================
// Worked scenarios
// =========================================================================

#[test]
fn test_cross_scenario() {
  let tree = AabbTree::build(cross_points()).unwrap();

  let hit = tree.nearest(Vec3::new(6.0, 0.0, 0.0)).unwrap();
  assert_eq!(hit.index, 1);
  assert_eq!(hit.distance, 4.0);
  assert_eq!(tree.nearest_neighbor(Vec3::new(6.0, 0.0, 0.0)), 1);
}

#[test]
fn test_odd_count_scenario() {
  let tree = AabbTree::build(vec![
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(2.0, 0.0, 0.0),
  ])
  .unwrap();

  assert_eq!(tree.nearest_neighbor(Vec3::new(2.0, 1.0, 0.0)), 2);
}

#[test]
fn test_single_point_always_wins() {
  let tree = AabbTree::build(vec![Vec3::new(3.0, -1.0, 2.0)]).unwrap();
  for query in random_queries(1, 20, 100.0) {
    assert_eq!(tree.nearest_neighbor(query), 0);
  }
}

#[test]
fn test_two_points() {
  let tree = AabbTree::build(vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)]).unwrap();
  assert_eq!(tree.levels(), 1);
  assert_eq!(tree.nearest_neighbor(Vec3::new(-3.0, 0.0, 0.0)), 0);
  assert_eq!(tree.nearest_neighbor(Vec3::new(7.0, 1.0, 0.0)), 1);
}

#[test]
fn test_query_on_a_point_returns_it() {
  let points = random_points(7, 333, 10.0);
  let tree = AabbTree::build(points.clone()).unwrap();
  for (index, point) in points.iter().enumerate().step_by(11) {
    let hit = tree.nearest(*point).unwrap();
    assert_eq!(hit.distance, 0.0);
    assert_eq!(hit.index as usize, index);
  }
}

// =========================================================================
// Exactness against brute force
// =========================================================================

#[test]
fn test_matches_linear_for_every_small_count() {
  for count in 1..=200usize {
    let tree = AabbTree::build(random_points(count as u64, count, 10.0)).unwrap();
    assert_matches_linear(&tree, &random_queries(count as u64, 16, 15.0));
  }
}

#[test]
fn test_matches_linear_for_larger_counts() {
  for count in [255, 256, 257, 511, 1000, 1023, 1025, 2048, 3001] {
    let tree = AabbTree::build(random_points(99 + count as u64, count, 50.0)).unwrap();
    assert_matches_linear(&tree, &random_queries(count as u64, 40, 60.0));
  }
}

/// Queries far outside the cloud still find the true nearest point.
#[test]
fn test_matches_linear_far_outside() {
  let tree = AabbTree::build(random_points(5, 777, 1.0)).unwrap();
  let queries = [
    Vec3::new(1.0e4, 0.0, 0.0),
    Vec3::new(-500.0, 300.0, -20.0),
    Vec3::new(0.0, 0.0, -1.0e3),
    Vec3::splat(2.0),
  ];
  assert_matches_linear(&tree, &queries);
}

#[test]
fn test_matches_linear_clustered() {
  let tree = AabbTree::build(clustered_points(11, 1500, 7)).unwrap();
  assert_matches_linear(&tree, &random_queries(11, 64, 60.0));
}

/// Lattice points give exact ties; distances must still match.
#[test]
fn test_matches_linear_with_ties() {
  let tree = AabbTree::build(grid_points(9)).unwrap();
  let mut queries = random_queries(3, 64, 10.0);
  queries.push(Vec3::new(0.5, 0.5, 0.5));
  queries.push(Vec3::new(4.5, 4.0, 4.0));
  assert_matches_linear(&tree, &queries);
}

#[test]
fn test_all_duplicates() {
  let tree = AabbTree::build(vec![Vec3::ONE; 37]).unwrap();
  let hit = tree.nearest(Vec3::ZERO).unwrap();
  assert_eq!(hit.distance, 3.0f32.sqrt());
  // First found in walk order is the leftmost leaf
  assert_eq!(hit.index, 0);
}

/// Ties keep the first point found, and the walk is left-biased.
#[test]
fn test_tie_break_is_first_in_walk_order() {
  let tree = AabbTree::build(vec![
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
  ])
  .unwrap();
  assert_eq!(tree.nearest_neighbor(Vec3::ZERO), 0);
}

// =========================================================================
// Stackless vs explicit stack
// =========================================================================

#[test]
fn test_stacked_walk_agrees_with_stackless() {
  for count in [1usize, 2, 3, 4, 5, 7, 8, 9, 31, 33, 100, 513, 2000] {
    let tree = AabbTree::build(random_points(count as u64 * 3, count, 20.0)).unwrap();
    for query in random_queries(count as u64, 50, 25.0) {
      assert_eq!(
        tree.nearest_neighbor(query),
        tree.nearest_neighbor_stacked(query),
        "N={} query={:?}",
        count,
        query
      );
    }
  }
}

#[test]
fn test_stacked_walk_agrees_on_ties() {
  let tree = AabbTree::build(grid_points(6)).unwrap();
  for query in random_queries(8, 100, 7.0) {
    let snapped = query.round();
    assert_eq!(tree.nearest_neighbor(snapped), tree.nearest_neighbor_stacked(snapped));
  }
}

// =========================================================================
// Pruning statistics
// =========================================================================

#[test]
fn test_pruning_on_coherent_points() {
  // Lattice order is spatially coherent, so sibling boxes are tight
  let tree = AabbTree::build(grid_points(16)).unwrap();
  let total_leaves = tree.layout().level_width(tree.layout().leaf_depth()) as u32;

  let (hit, stats) = tree.nearest_with_stats(Vec3::new(7.3, 8.1, 2.2));
  assert_eq!(tree.point(hit.unwrap().index), Some(Vec3::new(7.0, 8.0, 2.0)));
  assert!(stats.pruned > 0);
  assert!(stats.internal_visited > 0);
  assert!(
    stats.leaves_visited < total_leaves,
    "visited {} of {} leaves",
    stats.leaves_visited,
    total_leaves
  );
}

#[test]
fn test_single_level_stats() {
  let tree = AabbTree::build(vec![Vec3::ZERO, Vec3::ONE]).unwrap();
  let (_, stats) = tree.nearest_with_stats(Vec3::splat(0.9));
  assert_eq!(stats.internal_visited, 0);
  assert_eq!(stats.leaves_visited, 1);
  assert_eq!(stats.distance_tests(), 2);
}

// =========================================================================
// Concurrency
// =========================================================================

#[test]
fn test_batch_matches_sequential() {
  let tree = AabbTree::build(random_points(21, 1200, 30.0)).unwrap();
  let queries = random_queries(21, 300, 35.0);

  let batch = tree.nearest_neighbor_batch(&queries);
  let sequential: Vec<u32> = queries.iter().map(|q| tree.nearest_neighbor(*q)).collect();
  assert_eq!(batch, sequential);
}

#[test]
fn test_concurrent_queries_share_tree() {
  let tree = Arc::new(AabbTree::build(random_points(4, 900, 10.0)).unwrap());
  let queries = random_queries(4, 64, 12.0);
  let expected: Vec<u32> = queries.iter().map(|q| tree.nearest_neighbor(*q)).collect();

  std::thread::scope(|scope| {
    for _ in 0..4 {
      let tree = Arc::clone(&tree);
      let queries = &queries;
      let expected = &expected;
      scope.spawn(move || {
        for (query, want) in queries.iter().zip(expected) {
          assert_eq!(tree.nearest_neighbor(*query), *want);
        }
      });
    }
  });
}

/// The query result is independent of how the tree was built.
#[test]
fn test_serial_and_parallel_trees_answer_alike() {
  let points = random_points(8, 4000, 10.0);
  let serial = TreeBuilder::with_dispatch(BuildConfig::default(), SerialDispatch)
    .build(points.clone())
    .unwrap();
  let parallel = TreeBuilder::new(BuildConfig::default().with_min_parallel_width(1))
    .build(points)
    .unwrap();

  for query in random_queries(8, 50, 12.0) {
    assert_eq!(serial.nearest_neighbor(query), parallel.nearest_neighbor(query));
  }
}

// =========================================================================
// Linear reference
// =========================================================================

#[test]
fn test_linear_prefers_lowest_index_on_ties() {
  let points = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0)];
  let hit = nearest_neighbor_linear(&points, Vec3::ZERO).unwrap();
  assert_eq!(hit.index, 0);
}

#[test]
fn test_linear_empty_and_nan() {
  assert!(nearest_neighbor_linear(&[], Vec3::ZERO).is_none());
  assert!(nearest_neighbor_linear(&[Vec3::ZERO], Vec3::NAN).is_none());
}
