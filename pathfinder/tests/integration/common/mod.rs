// world_pathfinder/pathfinder/tests/integration/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use world_pathfinder_core::core::config::PathfinderConfig;
use world_pathfinder_core::core::geometry::{Transform, Vec3};
use world_pathfinder_core::systems::indoor::{FloorMeshData, PathNodeData, PathNodeKind, PortalLayout};
use world_pathfinder_core::systems::navmesh::NavMeshData;
use world_pathfinder_core::systems::pathfinding::PathFinder;
use world_pathfinder_core::world::building::{Building, BuildingTemplate};
use world_pathfinder_core::world::region::NavMeshRegion;
use world_pathfinder_core::world::zone::Zone;

pub const HOUSE_ID: u64 = 40;
pub const HOUSE_POSITION: Vec3 = Vec3::new(100.0, 100.0, 0.0);

pub fn finder() -> PathFinder {
    finder_with(PathfinderConfig { rng_seed: Some(11), ..PathfinderConfig::default() })
}

pub fn finder_with(config: PathfinderConfig) -> PathFinder {
    PathFinder::new(Arc::new(config))
}

pub fn grid_region(id: u32, origin: Vec3, cell: f32, cols: u32, rows: u32) -> Arc<NavMeshRegion> {
    let data = NavMeshData::grid(origin, cell, cols, rows);
    Arc::new(NavMeshRegion::from_data(id, format!("grid-{}", id), &data).unwrap())
}

/// 100 x 100 open field at the origin.
pub fn open_field() -> Zone {
    let zone = Zone::flat("field", 0.0);
    zone.add_region(grid_region(1, Vec3::zero(), 10.0, 10, 10));
    zone
}

pub fn square_floor(cell_number: u32, min: [f32; 2], max: [f32; 2], nodes: Vec<PathNodeData>, edges: Vec<[u32; 2]>) -> FloorMeshData {
    FloorMeshData {
        cell_number,
        vertices: vec![
            [min[0], 0.0, min[1]],
            [max[0], 0.0, min[1]],
            [max[0], 0.0, max[1]],
            [min[0], 0.0, max[1]],
        ],
        triangles: vec![[0, 1, 2], [0, 2, 3]],
        nodes,
        edges,
    }
}

pub fn node(id: u32, position: [f32; 3], kind: PathNodeKind, global_id: Option<u32>) -> PathNodeData {
    PathNodeData { id, position, kind, global_id }
}

/// Model-space layout: an exterior yard, a hall (cell 1) entered from the south and a room
/// (cell 2) east of the hall, joined at the model origin.
pub fn house_layout() -> PortalLayout {
    let yard = square_floor(
        0,
        [-20.0, -20.0],
        [20.0, 20.0],
        vec![node(1, [-5.0, 0.0, -10.0], PathNodeKind::BuildingEntrance, Some(1))],
        vec![],
    );
    let hall = square_floor(
        1,
        [-10.0, -10.0],
        [0.0, 10.0],
        vec![
            node(1, [-5.0, 0.0, -10.0], PathNodeKind::BuildingEntrance, Some(1)),
            node(2, [-5.0, 0.0, 0.0], PathNodeKind::Waypoint, None),
            node(3, [0.0, 0.0, 0.0], PathNodeKind::CellPortal, Some(2)),
        ],
        vec![[1, 2], [2, 3]],
    );
    let room = square_floor(
        2,
        [0.0, -10.0],
        [10.0, 10.0],
        vec![
            node(1, [0.0, 0.0, 0.0], PathNodeKind::CellPortal, Some(2)),
            node(2, [5.0, 0.0, 0.0], PathNodeKind::Waypoint, None),
        ],
        vec![[1, 2]],
    );
    PortalLayout::build("house", &[yard, hall, room]).unwrap()
}

pub fn house_template() -> Arc<BuildingTemplate> {
    Arc::new(BuildingTemplate::new("house", Some(Arc::new(house_layout()))))
}

/// Zone with the house placed at [`HOUSE_POSITION`] and an outdoor region south of it that
/// also covers the entrance.
pub fn village() -> (Zone, Arc<Building>) {
    let zone = Zone::flat("village", 0.0);
    zone.add_region(grid_region(7, Vec3::new(60.0, 40.0, 0.0), 20.0, 4, 3));
    let template = house_template();
    zone.add_template(template.clone());
    let house = Building::new(HOUSE_ID, template, Transform::new(HOUSE_POSITION, 0.0));
    zone.add_building(house.clone());
    (zone, house)
}
