// world_pathfinder/pathfinder/tests/integration/spawn_points.rs
mod common;

use common::{finder, grid_region};
use proptest::prelude::*;
use std::sync::Arc;
use world_pathfinder_core::core::error::PathError;
use world_pathfinder_core::core::geometry::{Sphere, Vec3};
use world_pathfinder_core::systems::navmesh::{AreaClass, NavMeshData};
use world_pathfinder_core::world::region::NavMeshRegion;
use world_pathfinder_core::world::zone::Zone;

fn meadow() -> Zone {
    let zone = Zone::flat("meadow", 2.5);
    zone.add_region(grid_region(1, Vec3::new(0.0, 0.0, 2.5), 2.0, 25, 25));
    zone
}

/// West half water, east half ground.
fn lakeshore() -> Zone {
    let mut data = NavMeshData::grid(Vec3::zero(), 1.0, 20, 10);
    for row in 0..10 {
        for col in 0..10 {
            data.polygons[NavMeshData::grid_poly(20, col, row)].area = AreaClass::Water;
        }
    }
    let zone = Zone::flat("lakeshore", 0.0);
    zone.add_region(Arc::new(NavMeshRegion::from_data(2, "shore", &data).unwrap()));
    zone
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn spawn_points_stay_near_the_area(cx in 10.0f32..40.0, cy in 10.0f32..40.0, radius in 1.0f32..6.0) {
        let finder = finder();
        let mut ctx = finder.new_context();
        let zone = meadow();
        let area = Sphere::new(Vec3::new(cx, cy, 2.5), radius);

        if let Ok(point) = finder.spawn_point_in_area(&mut ctx, &area, &zone) {
            let bound = radius * 1.5f32.sqrt() + 1e-3;
            prop_assert!(point.distance(area.center) <= bound, "{:?} too far from {:?}", point, area.center);
            prop_assert_eq!(point.z, 2.5);
        }
    }
}

#[test]
fn spawning_succeeds_on_open_ground() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = meadow();
    let area = Sphere::new(Vec3::new(25.0, 25.0, 2.5), 4.0);
    assert!(finder.spawn_point_in_area(&mut ctx, &area, &zone).is_ok());
}

#[test]
fn water_is_never_a_spawn_point() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = lakeshore();
    let area = Sphere::new(Vec3::new(10.5, 5.0, 0.0), 3.0);

    for _ in 0..20 {
        let point = finder.spawn_point_in_area(&mut ctx, &area, &zone).unwrap();
        assert!(point.x >= 10.0 - 1e-4, "spawned in water at {:?}", point);
    }
}

#[test]
fn all_water_area_has_no_spawn_point() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = lakeshore();
    let area = Sphere::new(Vec3::new(3.0, 5.0, 0.0), 1.0);

    let result = finder.spawn_point_in_area(&mut ctx, &area, &zone);

    assert!(matches!(result, Err(PathError::SearchExhausted(_))));
}
