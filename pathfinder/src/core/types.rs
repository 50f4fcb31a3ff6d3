// world_pathfinder/pathfinder/src/core/types.rs
use super::constants::POINT_ON_PATH_EPSILON;
use super::geometry::{Segment, Vec3};
use crate::world::building::Cell;
use std::sync::Arc;

/// A position plus the cell it is expressed in.
///
/// Without a cell the position is absolute world space (x/y ground, z up). With a cell it is
/// local to the owning building's model space (x/z ground, y up).
#[derive(Clone, Debug)]
pub struct WorldCoordinates {
    pub position: Vec3,
    pub cell: Option<Arc<Cell>>,
}

impl WorldCoordinates {
    pub fn world(position: Vec3) -> Self {
        WorldCoordinates { position, cell: None }
    }

    pub fn in_cell(position: Vec3, cell: Arc<Cell>) -> Self {
        WorldCoordinates { position, cell: Some(cell) }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
    }

    pub fn is_world(&self) -> bool {
        self.cell.is_none()
    }

    pub fn same_cell(&self, other: &WorldCoordinates) -> bool {
        match (&self.cell, &other.cell) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Absolute world position. A cell whose building is gone yields the raw local position.
    pub fn world_position(&self) -> Vec3 {
        match self.cell.as_ref().and_then(|c| c.owning_building()) {
            Some(building) => building.transform().from_model_space(self.position),
            None => self.position,
        }
    }
}

impl PartialEq for WorldCoordinates {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.same_cell(other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathOutcome {
    /// Reaches the requested goal.
    Complete,
    /// Ends at the closest reachable point; the goal was cut off.
    Partial,
    /// No route was found; the two endpoints joined directly.
    StraightLine,
}

impl PathOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathOutcome::Complete => "complete",
            PathOutcome::Partial => "partial",
            PathOutcome::StraightLine => "straight_line",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub points: Vec<WorldCoordinates>,
    pub outcome: PathOutcome,
}

impl Path {
    pub fn new(points: Vec<WorldCoordinates>, outcome: PathOutcome) -> Self {
        Path { points, outcome }
    }

    pub fn straight_line(start: &WorldCoordinates, goal: &WorldCoordinates) -> Self {
        Path { points: vec![start.clone(), goal.clone()], outcome: PathOutcome::StraightLine }
    }

    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn first(&self) -> Option<&WorldCoordinates> { self.points.first() }
    pub fn last(&self) -> Option<&WorldCoordinates> { self.points.last() }
    pub fn is_partial(&self) -> bool { self.outcome == PathOutcome::Partial }

    /// Polyline length measured in world space.
    pub fn length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|w| w[0].world_position().distance(w[1].world_position()))
            .sum()
    }

    /// Drops the waypoints an agent standing at `position` has already walked past.
    ///
    /// The first point is kept. When `position` lies on a same-cell segment (ground plane), every
    /// point between the first and that segment's end is removed. At a cell change whose two
    /// points coincide with `position`, the earlier of the two is removed.
    pub fn trim_passed(&mut self, position: &WorldCoordinates) {
        let here = position.world_position();
        let here_ground = Vec3::new(here.x, here.y, 0.0);

        if self.points.len() > 2 && self.points[0] == self.points[1] {
            self.points.remove(1);
        }

        for i in 2..self.points.len() {
            let next = &self.points[i];
            let prev = &self.points[i - 1];
            let end = next.world_position();
            let start = prev.world_position();

            if !next.same_cell(prev) {
                if end == start && here == end {
                    self.points.remove(i - 1);
                    return;
                }
                continue;
            }

            let ground = Segment::new(Vec3::new(start.x, start.y, 0.0), Vec3::new(end.x, end.y, 0.0));
            if ground.closest_point(here_ground).distance(here_ground) <= POINT_ON_PATH_EPSILON {
                self.points.drain(1..i);
                return;
            }
        }
    }
}
