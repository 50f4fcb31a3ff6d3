// world_pathfinder/pathfinder/tests/integration/indoor_paths.rs
mod common;

use common::{finder, grid_region, house_template, node, square_floor, village, HOUSE_POSITION};
use std::sync::Arc;
use world_pathfinder_core::core::error::PathError;
use world_pathfinder_core::core::geometry::{Transform, Vec3};
use world_pathfinder_core::core::types::{PathOutcome, WorldCoordinates};
use world_pathfinder_core::systems::indoor::{FloorMeshData, PathNodeKind, PortalLayout};
use world_pathfinder_core::world::building::{Building, BuildingTemplate};
use world_pathfinder_core::world::zone::Zone;

fn cell_point(house: &Arc<Building>, cell_number: u32, x: f32, z: f32) -> WorldCoordinates {
    WorldCoordinates::in_cell(Vec3::new(x, 0.0, z), house.cell_by_number(cell_number).unwrap())
}

fn cell_transitions(points: &[WorldCoordinates]) -> usize {
    points.windows(2).filter(|pair| !pair[0].same_cell(&pair[1])).count()
}

#[test]
fn same_triangle_is_a_direct_segment() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = village();
    let a = cell_point(&house, 1, -7.0, 5.0);
    let b = cell_point(&house, 1, -3.0, 8.0);

    let path = finder.find_path(&mut ctx, &a, &b, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.points, vec![a, b]);
}

#[test]
fn entering_a_building_changes_cell_once() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = village();
    let start = WorldCoordinates::world(HOUSE_POSITION + Vec3::new(-5.0, -30.0, 0.0));
    let goal = cell_point(&house, 1, -7.0, 5.0);

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    assert_eq!(cell_transitions(&path.points), 1);
    // The entrance is crossed at the doorway in both frames.
    let door = HOUSE_POSITION + Vec3::new(-5.0, -10.0, 0.0);
    assert!(path.points.iter().any(|p| p.is_world() && p.position.approx_eq(door, 1e-4)));
}

#[test]
fn leaving_a_building_continues_outdoors() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = village();
    let start = cell_point(&house, 2, 6.0, 3.0);
    let goal = WorldCoordinates::world(HOUSE_POSITION + Vec3::new(0.0, -40.0, 0.0));

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    let hall = house.cell_by_number(1).unwrap();
    assert!(path.points.iter().any(|p| p.cell.as_ref().map_or(false, |c| Arc::ptr_eq(c, &hall))));
}

#[test]
fn leaving_without_outdoor_mesh_is_partial() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = Zone::flat("bare", 0.0);
    let house = Building::new(1, house_template(), Transform::new(HOUSE_POSITION, 0.0));
    zone.add_building(house.clone());
    let start = cell_point(&house, 1, -7.0, 5.0);
    let goal = WorldCoordinates::world(HOUSE_POSITION + Vec3::new(0.0, -80.0, 0.0));

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert!(path.is_partial());
    assert_eq!(path.first(), Some(&start));
    let exit = path.last().unwrap();
    assert!(exit.is_world());
    assert!(exit.position.approx_eq(HOUSE_POSITION + Vec3::new(-5.0, -10.0, 0.0), 1e-4));
}

#[test]
fn cell_to_cell_passes_the_shared_portal() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = village();
    let start = cell_point(&house, 1, -7.0, 5.0);
    let goal = cell_point(&house, 2, 6.0, 3.0);

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    assert_eq!(cell_transitions(&path.points), 1);
    assert!(path.points.iter().all(|p| !p.is_world()));
}

#[test]
fn different_buildings_are_unsupported() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = village();
    let other = Building::new(41, house_template(), Transform::new(Vec3::new(300.0, 100.0, 0.0), 0.3));
    zone.add_building(other.clone());
    let start = cell_point(&house, 1, -7.0, 5.0);
    let goal = cell_point(&other, 1, -7.0, 5.0);

    let result = finder.find_path(&mut ctx, &start, &goal, &zone);

    assert!(matches!(result, Err(PathError::UnsupportedTopology(_))));
}

#[test]
fn building_without_layout_is_structurally_missing() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = Zone::flat("shacks", 0.0);
    let template = Arc::new(BuildingTemplate::new("shack", None));
    let shack = Building::with_cells(5, template, Transform::new(Vec3::new(10.0, 10.0, 0.0), 0.0), &[1]);
    zone.add_building(shack.clone());
    let start = WorldCoordinates::world(Vec3::new(0.0, 0.0, 0.0));
    let goal = cell_point(&shack, 1, 1.0, 1.0);

    let result = finder.find_path(&mut ctx, &start, &goal, &zone);

    assert!(matches!(result, Err(PathError::StructuralMissing(_))));
}

#[test]
fn goal_off_the_floor_exhausts_search() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = village();
    let start = WorldCoordinates::world(HOUSE_POSITION + Vec3::new(-5.0, -30.0, 0.0));
    let goal = cell_point(&house, 1, 50.0, 50.0);

    let result = finder.find_path(&mut ctx, &start, &goal, &zone);

    assert!(matches!(result, Err(PathError::SearchExhausted(_))));
}

#[test]
fn trimming_at_the_doorway_drops_the_outside_copy() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = village();
    let start = WorldCoordinates::world(HOUSE_POSITION + Vec3::new(-5.0, -30.0, 0.0));
    let goal = cell_point(&house, 1, -7.0, 5.0);
    let mut path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();
    let before = path.len();

    let door = WorldCoordinates::world(HOUSE_POSITION + Vec3::new(-5.0, -10.0, 0.0));
    path.trim_passed(&door);

    assert_eq!(path.len(), before - 1);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(cell_transitions(&path.points), 1);
    assert_eq!(path.points[1].cell.as_ref().map(|c| c.cell_number()), Some(1));
}

/// The house turned a quarter turn counter-clockwise: model (x, _, z) lands at world
/// (-z, x) around the building origin, so the doorway sits east of it.
fn turned_village() -> (Zone, Arc<Building>) {
    let zone = Zone::flat("turned", 0.0);
    zone.add_region(grid_region(7, Vec3::new(60.0, 40.0, 0.0), 20.0, 4, 3));
    let house = Building::new(42, house_template(), Transform::new(HOUSE_POSITION, std::f32::consts::FRAC_PI_2));
    zone.add_building(house.clone());
    (zone, house)
}

fn first_world_waypoint(points: &[WorldCoordinates], skip: usize) -> Option<&WorldCoordinates> {
    points.iter().skip(skip).find(|p| p.is_world())
}

#[test]
fn turned_building_is_entered_at_its_world_doorway() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = turned_village();
    let door = HOUSE_POSITION + Vec3::new(10.0, -5.0, 0.0);
    // Model (-5, 0, -18): on the yard, straight in front of the door.
    let start = WorldCoordinates::world(HOUSE_POSITION + Vec3::new(18.0, -5.0, 0.0));
    let goal = cell_point(&house, 1, -7.0, 5.0);

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    assert_eq!(cell_transitions(&path.points), 1);
    let entrance = first_world_waypoint(&path.points, 1).unwrap();
    assert!(entrance.position.approx_eq(door, 1e-3), "entered at {:?}", entrance.position);
}

#[test]
fn turned_building_is_left_through_its_world_doorway() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let (zone, house) = turned_village();
    let door = HOUSE_POSITION + Vec3::new(10.0, -5.0, 0.0);
    let start = cell_point(&house, 2, 6.0, 3.0);
    let goal = WorldCoordinates::world(HOUSE_POSITION + Vec3::new(18.0, -5.0, 0.0));

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    let exit = first_world_waypoint(&path.points, 0).unwrap();
    assert!(exit.position.approx_eq(door, 1e-3), "left at {:?}", exit.position);
    assert!(path.points.iter().skip_while(|p| !p.is_world()).all(|p| p.is_world()));
}

/// A hall split into west and east halves with no shared floor edge; only its two anchor nodes
/// are linked.
fn split_hall_layout() -> PortalLayout {
    let yard = square_floor(
        0,
        [-20.0, -20.0],
        [20.0, 20.0],
        vec![node(1, [-8.0, 0.0, -10.0], PathNodeKind::BuildingEntrance, Some(1))],
        vec![],
    );
    let hall = FloorMeshData {
        cell_number: 1,
        vertices: vec![
            [-10.0, 0.0, -10.0],
            [-6.0, 0.0, -10.0],
            [-6.0, 0.0, 10.0],
            [-10.0, 0.0, 10.0],
            [-4.0, 0.0, -10.0],
            [0.0, 0.0, -10.0],
            [0.0, 0.0, 10.0],
            [-4.0, 0.0, 10.0],
        ],
        triangles: vec![[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]],
        nodes: vec![
            node(1, [-8.0, 0.0, -10.0], PathNodeKind::BuildingEntrance, Some(1)),
            node(2, [-8.0, 0.0, -2.0], PathNodeKind::Waypoint, None),
            node(3, [-2.0, 0.0, -2.0], PathNodeKind::Waypoint, None),
        ],
        edges: vec![[1, 2], [2, 3]],
    };
    PortalLayout::build("split hall", &[yard, hall]).unwrap()
}

#[test]
fn split_floor_is_crossed_through_its_anchor_nodes() {
    let finder = finder();
    let mut ctx = finder.new_context();
    let zone = Zone::flat("split", 0.0);
    let template = Arc::new(BuildingTemplate::new("split hall", Some(Arc::new(split_hall_layout()))));
    let hall_house = Building::new(43, template, Transform::new(HOUSE_POSITION, 0.0));
    zone.add_building(hall_house.clone());
    let start = cell_point(&hall_house, 1, -9.0, 5.0);
    let goal = cell_point(&hall_house, 1, -0.5, 5.0);

    let path = finder.find_path(&mut ctx, &start, &goal, &zone).unwrap();

    assert_eq!(path.outcome, PathOutcome::Complete);
    assert_eq!(
        path.points,
        vec![
            start.clone(),
            cell_point(&hall_house, 1, -8.0, -2.0),
            cell_point(&hall_house, 1, -2.0, -2.0),
            goal.clone(),
        ]
    );
    assert_eq!(cell_transitions(&path.points), 0);
}
