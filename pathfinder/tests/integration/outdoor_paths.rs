// world_pathfinder/pathfinder/tests/integration/outdoor_paths.rs
mod common;

use common::{finder, finder_with, grid_region, open_field};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use world_pathfinder_core::core::config::PathfinderConfig;
use world_pathfinder_core::core::error::PathError;
use world_pathfinder_core::core::geometry::Vec3;
use world_pathfinder_core::core::types::{PathOutcome, WorldCoordinates};
use world_pathfinder_core::systems::navmesh::{NavMesh, NavMeshData};
use world_pathfinder_core::world::region::NavMeshRegion;
use world_pathfinder_core::world::zone::{Zone, ZoneQuery};

fn w(x: f32, y: f32) -> WorldCoordinates {
    WorldCoordinates::world(Vec3::new(x, y, 0.0))
}

/// Zone double that counts every call made into it.
struct CountingZone {
    inner: Zone,
    calls: AtomicUsize,
}

impl ZoneQuery for CountingZone {
    fn regions_overlapping(&self, x: f32, y: f32, radius: f32) -> Vec<Arc<NavMeshRegion>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.regions_overlapping(x, y, radius)
    }

    fn terrain_height(&self, x: f32, y: f32) -> f32 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.terrain_height(x, y)
    }
}

#[test]
fn open_field_path_matches_straight_distance() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = open_field();
    let (start, goal) = (w(31.0, 41.0), w(70.0, 55.0));

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    assert!(path.len() <= 4, "unexpected detour: {:?}", path.points);
    let straight = start.position.distance(goal.position);
    assert!((path.length() - straight).abs() < 1e-2);
}

#[test]
fn entering_a_region_starts_at_the_boundary_crossing() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = open_field();
    let (start, goal) = (w(-100.0, 55.0), w(50.0, 55.0));

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.len(), 3);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    // Bounding circle of the field: center (50, 50), radius 48.75.
    let expected_x = 50.0 - (48.75f32 * 48.75 - 25.0).sqrt();
    assert!((path.points[1].position.x - expected_x).abs() < 1e-2);
    assert!((path.points[1].position.y - 55.0).abs() < 1e-3);
}

#[test]
fn unknown_terrain_falls_back_to_straight_line() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = Zone::flat("empty", 0.0);
    let (start, goal) = (w(0.0, 0.0), w(250.0, -30.0));

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::StraightLine);
    assert_eq!(path.points, vec![start, goal]);
}

fn walled_zone() -> Zone {
    let mut data = NavMeshData::grid(Vec3::zero(), 10.0, 5, 1);
    data.polygons[NavMeshData::grid_poly(5, 2, 0)].disabled = true;
    let zone = Zone::flat("walled", 0.0);
    zone.add_region(Arc::new(NavMeshRegion::from_data(3, "walled", &data).unwrap()));
    zone
}

#[test]
fn blocked_goal_yields_partial_path() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = walled_zone();
    let (start, goal) = (w(5.0, 5.0), w(45.0, 5.0));

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert!(path.is_partial());
    assert_eq!(path.first(), Some(&start));
    let last = path.last().unwrap().position;
    assert!((last.x - 20.0).abs() < 1e-3, "partial path should stop at the wall, got {:?}", last);
    assert_ne!(path.last(), Some(&goal));
}

#[test]
fn partial_paths_can_be_refused() {
    let finder = finder_with(PathfinderConfig { allow_partial: false, ..PathfinderConfig::default() });
    let mut ctx = finder.new_context();
    let zone = walled_zone();
    let (start, goal) = (w(5.0, 5.0), w(45.0, 5.0));

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::StraightLine);
    assert_eq!(path.points, vec![start, goal]);
}

#[test]
fn non_finite_endpoints_never_reach_the_zone() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = CountingZone { inner: open_field(), calls: AtomicUsize::new(0) };

    let bad = WorldCoordinates::world(Vec3::new(10.0, f32::NAN, 0.0));
    let good = w(20.0, 20.0);
    assert!(matches!(finder.find_path(&mut ctx, &bad, &good, &zone), Err(PathError::InvalidInput(_))));
    assert!(matches!(finder.find_path(&mut ctx, &good, &bad, &zone), Err(PathError::InvalidInput(_))));
    let inf = WorldCoordinates::world(Vec3::new(f32::NEG_INFINITY, 0.0, 0.0));
    assert!(matches!(finder.find_path_to_any(&mut ctx, &good, &[inf], &zone, true), Err(PathError::InvalidInput(_))));

    assert_eq!(zone.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn zero_length_query_returns_the_start() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = open_field();
    let here = w(42.0, 17.0);

    let path = finder.find_path(&mut ctx, &here, &here, &zone).unwrap();

    assert!(!path.is_empty());
    assert_eq!(path.first(), Some(&here));
    assert_eq!(path.last(), Some(&here));
}

#[test]
fn closest_destination_is_chosen() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = open_field();
    let start = w(51.0, 52.0);
    let goals = [w(80.0, 80.0), w(55.0, 45.0), w(20.0, 30.0)];

    let path = finder.find_path_to_any(&mut ctx, &start, &goals, &zone, true).unwrap();

    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goals[1]));
    assert!(matches!(
        finder.find_path_to_any(&mut ctx, &start, &[], &zone, true),
        Err(PathError::InvalidInput(_))
    ));
}

#[test]
fn unloaded_navmesh_is_skipped_until_reloaded() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = Zone::flat("reload", 0.0);
    let region = grid_region(9, Vec3::zero(), 10.0, 10, 10);
    zone.add_region(region.clone());
    let (start, goal) = (w(31.0, 41.0), w(60.0, 65.0));

    let unloaded_at = region.navmesh().unload();
    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();
    assert_eq!(path.outcome, PathOutcome::StraightLine);

    let mesh = NavMesh::build(&NavMeshData::grid(Vec3::zero(), 10.0, 10, 10)).unwrap();
    let reloaded_at = region.navmesh().reload(mesh);
    assert!(reloaded_at > unloaded_at);
    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();
    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.last(), Some(&goal));
}

#[test]
fn trimming_drops_passed_waypoints() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = open_field();
    let (start, goal) = (w(10.0, 15.0), w(90.0, 15.0));

    let mut path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();
    path.trim_passed(&w(50.0, 15.0));

    assert_eq!(path.points, vec![start, goal]);
}
