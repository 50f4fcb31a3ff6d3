// world_pathfinder/pathfinder/src/systems/pathfinding/indoor.rs
use super::coordinator::PathFinder;
use crate::concurrent::query_context::NavQueryContext;
use crate::core::constants::GOAL_SNAP_EPSILON;
use crate::core::error::{PathError, PathResult};
use crate::core::geometry::Vec3;
use crate::core::types::{Path, PathOutcome, WorldCoordinates};
use crate::systems::indoor::{FloorMesh, PathNodeRef, PortalLayout};
use crate::world::building::{Building, Cell};
use crate::world::zone::ZoneQuery;
use std::sync::Arc;
use tracing::{debug, error};

fn missing(what: String) -> PathError {
    error!("{}", what);
    PathError::StructuralMissing(what)
}

fn owning_building(cell: &Cell) -> PathResult<Arc<Building>> {
    cell.owning_building()
        .ok_or_else(|| missing(format!("cell {} has no owning building", cell.id())))
}

fn layout_of(building: &Building) -> PathResult<&Arc<PortalLayout>> {
    building.template().portal_layout().ok_or_else(|| {
        missing(format!("building template '{}' has no portal layout", building.template().name()))
    })
}

fn floor_of(layout: &PortalLayout, cell_number: u32) -> PathResult<&FloorMesh> {
    layout
        .floor(cell_number)
        .ok_or_else(|| missing(format!("portal layout '{}' has no floor {}", layout.name(), cell_number)))
}

/// Appends `point` unless it repeats the previous waypoint.
fn push_point(points: &mut Vec<WorldCoordinates>, point: WorldCoordinates) {
    if points.last() != Some(&point) {
        points.push(point);
    }
}

/// Converts a model-space point on floor `cell_number` into path coordinates: world space for
/// the exterior floor, cell-local otherwise.
fn floor_point(building: &Building, cell_number: u32, model: Vec3) -> PathResult<WorldCoordinates> {
    if cell_number == 0 {
        return Ok(WorldCoordinates::world(building.to_world(model)));
    }
    building
        .cell_by_number(cell_number)
        .map(|cell| WorldCoordinates::in_cell(model, cell))
        .ok_or_else(|| missing(format!("building {} has no cell {}", building.id(), cell_number)))
}

/// Interior corners of the smoothed leg `from -> to` on one floor. Empty when the floor has no
/// route between the two points.
fn smoothed_leg(floor: &FloorMesh, from: Vec3, to: Vec3) -> Vec<Vec3> {
    match floor.find_path(from, to) {
        Some(mut points) if points.len() > 2 => {
            points.pop();
            points.remove(0);
            points
        }
        Some(_) => Vec::new(),
        None => {
            debug!("Floor {} has no smooth leg {:?} -> {:?}", floor.cell_number(), from, to);
            Vec::new()
        }
    }
}

/// Coarse route between two anchors; single-node and missing routes are failures.
fn portal_route(layout: &PortalLayout, from: PathNodeRef, to: PathNodeRef) -> PathResult<Vec<PathNodeRef>> {
    match layout.path(from, to) {
        Some(route) if route.len() > 1 => Ok(route),
        Some(_) => {
            error!("Portal layout '{}' returned a single-node route {:?} -> {:?}", layout.name(), from, to);
            Err(PathError::SearchExhausted(format!("single-node portal route in '{}'", layout.name())))
        }
        None => {
            error!("Portal layout '{}' has no route {:?} -> {:?}", layout.name(), from, to);
            Err(PathError::SearchExhausted(format!("no portal route in '{}'", layout.name())))
        }
    }
}

impl PathFinder {
    fn traverse(
        &self,
        building: &Building,
        layout: &PortalLayout,
        route: &[PathNodeRef],
        points: &mut Vec<WorldCoordinates>,
    ) -> PathResult<()> {
        for &node_ref in route {
            let node = layout
                .node(node_ref)
                .ok_or_else(|| missing(format!("portal layout '{}' lost node {:?}", layout.name(), node_ref)))?;
            push_point(points, floor_point(building, node_ref.cell_number, node.position)?);
        }
        Ok(())
    }

    fn push_leg(
        &self,
        building: &Building,
        floor: &FloorMesh,
        from: Vec3,
        to: Vec3,
        points: &mut Vec<WorldCoordinates>,
    ) -> PathResult<()> {
        for corner in smoothed_leg(floor, from, to) {
            push_point(points, floor_point(building, floor.cell_number(), corner)?);
        }
        Ok(())
    }

    /// Outside into a cell: exterior anchor, portal route, smoothed approach, goal.
    pub(crate) fn find_world_to_cell(
        &self,
        start: &WorldCoordinates,
        goal: &WorldCoordinates,
        goal_cell: &Cell,
    ) -> PathResult<Path> {
        let building = owning_building(goal_cell)?;
        let layout = layout_of(&building)?;
        let model_start = building.to_model_space(start.position);

        let entrance = layout.exterior_anchor(model_start).ok_or_else(|| {
            missing(format!("portal layout '{}' has no entrance node", layout.name()))
        })?;
        let goal_floor = floor_of(layout, goal_cell.cell_number())?;
        let goal_tri = goal_floor.find_triangle(goal.position).ok_or_else(|| {
            PathError::SearchExhausted(format!("goal {:?} is off floor {}", goal.position, goal_cell.cell_number()))
        })?;
        let target = goal_floor
            .nearest_reachable_node(goal_tri, goal.position)
            .map(|n| PathNodeRef::new(goal_cell.cell_number(), n.index))
            .ok_or_else(|| missing(format!("floor {} of '{}' has no reachable anchor", goal_cell.cell_number(), layout.name())))?;

        let route = portal_route(layout, entrance, target)?;
        let mut points = vec![start.clone()];
        if let (Some(exterior), Some(first)) = (layout.floor(0), layout.node(entrance)) {
            if exterior.find_triangle(model_start).is_some() {
                self.push_leg(&building, exterior, model_start, first.position, &mut points)?;
            }
        }
        self.traverse(&building, layout, &route, &mut points)?;
        if let Some(last) = layout.node(target) {
            self.push_leg(&building, goal_floor, last.position, goal.position, &mut points)?;
        }
        push_point(&mut points, goal.clone());
        Ok(Path::new(points, PathOutcome::Complete))
    }

    /// Inside a cell to the outside: exit through the portal graph, then continue outdoors. A
    /// failed outdoor continuation leaves the interior part as a partial path.
    pub(crate) fn find_cell_to_world(
        &self,
        ctx: &mut NavQueryContext,
        start: &WorldCoordinates,
        start_cell: &Cell,
        goal: &WorldCoordinates,
        zone: &dyn ZoneQuery,
        allow_partial: bool,
    ) -> PathResult<Path> {
        let building = owning_building(start_cell)?;
        let layout = layout_of(&building)?;
        let model_goal = building.to_model_space(goal.position);

        let start_floor = floor_of(layout, start_cell.cell_number())?;
        let start_tri = start_floor.find_triangle(start.position).ok_or_else(|| {
            PathError::SearchExhausted(format!("start {:?} is off floor {}", start.position, start_cell.cell_number()))
        })?;
        let source = start_floor
            .nearest_reachable_node(start_tri, model_goal)
            .map(|n| PathNodeRef::new(start_cell.cell_number(), n.index))
            .ok_or_else(|| missing(format!("floor {} of '{}' has no reachable anchor", start_cell.cell_number(), layout.name())))?;
        let exit = layout.exterior_anchor(model_goal).ok_or_else(|| {
            missing(format!("portal layout '{}' has no entrance node", layout.name()))
        })?;

        let route = portal_route(layout, source, exit)?;
        let mut points = vec![start.clone()];
        if let Some(first) = layout.node(source) {
            self.push_leg(&building, start_floor, start.position, first.position, &mut points)?;
        }
        self.traverse(&building, layout, &route, &mut points)?;

        let Some(exit_point) = points.last().cloned() else {
            return Err(PathError::SearchExhausted("empty interior route".to_string()));
        };
        if exit_point.position.distance(goal.position) <= GOAL_SNAP_EPSILON {
            points.pop();
            push_point(&mut points, goal.clone());
            return Ok(Path::new(points, PathOutcome::Complete));
        }

        match self.find_outdoor(ctx, &exit_point, std::slice::from_ref(goal), zone, allow_partial) {
            Ok(outside) => {
                let outcome = outside.outcome;
                for point in outside.points.into_iter().skip(1) {
                    push_point(&mut points, point);
                }
                Ok(Path::new(points, outcome))
            }
            Err(e) => {
                debug!("Outdoor continuation from {:?} failed: {}", exit_point.position, e);
                Ok(Path::new(points, PathOutcome::Partial))
            }
        }
    }

    /// Between two cells of the same building, or across a disconnected single floor.
    pub(crate) fn find_cell_to_cell(
        &self,
        start: &WorldCoordinates,
        start_cell: &Cell,
        goal: &WorldCoordinates,
        goal_cell: &Cell,
    ) -> PathResult<Path> {
        let building = owning_building(start_cell)?;
        let goal_building = owning_building(goal_cell)?;
        if !Arc::ptr_eq(&building, &goal_building) {
            return Err(PathError::UnsupportedTopology(format!(
                "cannot route from building {} to building {} indoors",
                building.id(),
                goal_building.id()
            )));
        }
        self.route_between_floors(&building, start, start_cell.cell_number(), goal, goal_cell.cell_number())
    }

    fn route_between_floors(
        &self,
        building: &Building,
        start: &WorldCoordinates,
        start_number: u32,
        goal: &WorldCoordinates,
        goal_number: u32,
    ) -> PathResult<Path> {
        let layout = layout_of(building)?;
        let start_floor = floor_of(layout, start_number)?;
        let goal_floor = floor_of(layout, goal_number)?;
        let start_tri = start_floor.find_triangle(start.position).ok_or_else(|| {
            PathError::SearchExhausted(format!("start {:?} is off floor {}", start.position, start_number))
        })?;
        let goal_tri = goal_floor.find_triangle(goal.position).ok_or_else(|| {
            PathError::SearchExhausted(format!("goal {:?} is off floor {}", goal.position, goal_number))
        })?;

        let source = start_floor
            .nearest_reachable_node(start_tri, goal.position)
            .map(|n| PathNodeRef::new(start_number, n.index))
            .ok_or_else(|| missing(format!("floor {} of '{}' has no reachable anchor", start_number, layout.name())))?;
        let target = goal_floor
            .nearest_reachable_node(goal_tri, goal.position)
            .map(|n| PathNodeRef::new(goal_number, n.index))
            .ok_or_else(|| missing(format!("floor {} of '{}' has no reachable anchor", goal_number, layout.name())))?;

        let route = portal_route(layout, source, target)?;
        let mut points = vec![start.clone()];
        if let Some(first) = layout.node(source) {
            self.push_leg(building, start_floor, start.position, first.position, &mut points)?;
        }
        self.traverse(building, layout, &route, &mut points)?;
        if let Some(last) = layout.node(target) {
            self.push_leg(building, goal_floor, last.position, goal.position, &mut points)?;
        }
        push_point(&mut points, goal.clone());
        Ok(Path::new(points, PathOutcome::Complete))
    }

    /// Both endpoints in one cell: a direct floor search, falling back to the portal graph when
    /// the two points lie on disconnected parts of the floor.
    pub(crate) fn find_within_cell(
        &self,
        start: &WorldCoordinates,
        goal: &WorldCoordinates,
        cell: &Arc<Cell>,
    ) -> PathResult<Path> {
        let building = owning_building(cell)?;
        let layout = layout_of(&building)?;
        let floor = floor_of(layout, cell.cell_number())?;
        let start_tri = floor.find_triangle(start.position).ok_or_else(|| {
            PathError::SearchExhausted(format!("start {:?} is off floor {}", start.position, cell.cell_number()))
        })?;
        let goal_tri = floor.find_triangle(goal.position).ok_or_else(|| {
            PathError::SearchExhausted(format!("goal {:?} is off floor {}", goal.position, cell.cell_number()))
        })?;

        if start_tri == goal_tri {
            return Ok(Path::new(vec![start.clone(), goal.clone()], PathOutcome::Complete));
        }
        if !floor.connected(start_tri, goal_tri) {
            debug!("Floor {} is split between {:?} and {:?}, using portals", cell.cell_number(), start.position, goal.position);
            return self.route_between_floors(&building, start, cell.cell_number(), goal, cell.cell_number());
        }

        let corners = floor
            .find_path(start.position, goal.position)
            .ok_or_else(|| PathError::SearchExhausted(format!("no route on floor {}", cell.cell_number())))?;
        let last = corners.len().saturating_sub(1);
        let mut points = Vec::with_capacity(corners.len());
        points.push(start.clone());
        for corner in &corners[1..last] {
            push_point(&mut points, WorldCoordinates::in_cell(*corner, cell.clone()));
        }
        push_point(&mut points, goal.clone());
        Ok(Path::new(points, PathOutcome::Complete))
    }
}
