// world_pathfinder/pathfinder/tests/integration/concurrency.rs
mod common;

use common::{grid_region, village};
use std::sync::Arc;
use std::thread;
use world_pathfinder_core::concurrent::query_context::with_thread_context;
use world_pathfinder_core::concurrent::thread_pools::{PathRequest, PathfindingPool};
use world_pathfinder_core::core::config::PathfinderConfig;
use world_pathfinder_core::core::geometry::{Sphere, Vec3};
use world_pathfinder_core::core::types::{PathOutcome, WorldCoordinates};
use world_pathfinder_core::systems::navmesh::{NavMesh, NavMeshData};
use world_pathfinder_core::systems::pathfinding::PathFinder;
use world_pathfinder_core::world::zone::Zone;

fn pool(threads: usize) -> PathfindingPool {
    let mut config = PathfinderConfig { rng_seed: Some(3), ..PathfinderConfig::default() };
    config.worker_pool.threads = threads;
    PathfindingPool::new(Arc::new(PathFinder::new(Arc::new(config)))).unwrap()
}

fn field_requests(count: usize) -> Vec<PathRequest> {
    (0..count)
        .map(|i| {
            let offset = (i % 40) as f32;
            PathRequest::new(
                WorldCoordinates::world(Vec3::new(25.0 + offset * 0.5, 31.0, 0.0)),
                WorldCoordinates::world(Vec3::new(72.0, 44.0 + offset * 0.5, 0.0)),
            )
        })
        .collect()
}

#[test]
fn batch_results_match_requests() {
    let pool = pool(4);
    let zone = Zone::flat("field", 0.0);
    zone.add_region(grid_region(1, Vec3::zero(), 10.0, 10, 10));
    let requests = field_requests(64);

    let results = pool.find_paths(&requests, &zone);

    assert_eq!(results.len(), requests.len());
    for (request, result) in requests.iter().zip(&results) {
        let path = result.as_ref().unwrap();
        assert_eq!(path.outcome, PathOutcome::Complete);
        assert_eq!(path.first(), Some(&request.start));
        assert_eq!(path.last(), Some(&request.goal));
    }
}

#[test]
fn queries_survive_concurrent_reloads() {
    let pool = pool(4);
    let zone = Zone::flat("field", 0.0);
    let region = grid_region(1, Vec3::zero(), 10.0, 10, 10);
    zone.add_region(region.clone());
    let requests = field_requests(200);
    let before = region.navmesh().generation();
    let reloads = 25;

    let results = thread::scope(|scope| {
        let reloader = scope.spawn(|| {
            for _ in 0..reloads {
                let mesh = NavMesh::build(&NavMeshData::grid(Vec3::zero(), 10.0, 10, 10)).unwrap();
                region.navmesh().reload(mesh);
                thread::yield_now();
            }
        });
        let results = pool.find_paths(&requests, &zone);
        reloader.join().unwrap();
        results
    });

    assert_eq!(region.navmesh().generation(), before + reloads);
    for (request, result) in requests.iter().zip(&results) {
        let path = result.as_ref().unwrap();
        assert_eq!(path.first(), Some(&request.start));
        assert_eq!(path.last(), Some(&request.goal));
    }
}

#[test]
fn indoor_and_spawn_batches_run_in_parallel() {
    let pool = pool(3);
    let (zone, house) = village();
    let hall = house.cell_by_number(1).unwrap();
    let requests: Vec<PathRequest> = (0..12)
        .map(|i| {
            PathRequest::new(
                WorldCoordinates::world(Vec3::new(95.0 - i as f32, 70.0, 0.0)),
                WorldCoordinates::in_cell(Vec3::new(-7.0, 0.0, 5.0), hall.clone()),
            )
        })
        .collect();

    for result in pool.find_paths(&requests, &zone) {
        let path = result.unwrap();
        assert_eq!(path.outcome, PathOutcome::Complete);
        assert!(path.last().map_or(false, |p| p.same_cell(&requests[0].goal)));
    }

    let areas: Vec<Sphere> = (0..8).map(|i| Sphere::new(Vec3::new(70.0 + i as f32 * 8.0, 70.0, 0.0), 15.0)).collect();
    let spawned = pool.spawn_points(&areas, &zone);
    assert!(spawned.iter().all(|r| r.is_ok()));
}

#[test]
fn worker_contexts_are_per_thread() {
    let config = PathfinderConfig::default();
    let here = with_thread_context(&config, |ctx| ctx as *const _ as usize);
    let there = thread::spawn(move || with_thread_context(&PathfinderConfig::default(), |ctx| ctx as *const _ as usize))
        .join()
        .unwrap();
    assert_ne!(here, there);
}
