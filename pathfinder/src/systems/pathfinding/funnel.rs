// world_pathfinder/pathfinder/src/systems/pathfinding/funnel.rs
use crate::core::geometry::{Vec2, Vec3};

const SAME_POINT_EPSILON_SQ: f32 = 1e-6;

/// Edge shared by two consecutive corridor polygons, seen in the direction of travel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Portal {
    pub left: Vec3,
    pub right: Vec3,
}

/// Plane the funnel is evaluated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroundPlane {
    /// World space: x/y ground, z up.
    Xy,
    /// Building model space: x/z ground, y up.
    Xz,
}

impl GroundPlane {
    fn project(self, p: Vec3) -> Vec2 {
        match self {
            GroundPlane::Xy => p.xy(),
            GroundPlane::Xz => p.xz(),
        }
    }
}

/// Simple stupid funnel: the taut polyline from `start` to `end` through `portals`.
///
/// "Left" is the counter-clockwise side in the projected plane. The result always begins with
/// `start` and ends with `end`; consecutive duplicates are skipped.
pub fn string_pull(start: Vec3, portals: &[Portal], end: Vec3, plane: GroundPlane) -> Vec<Vec3> {
    let mut all = Vec::with_capacity(portals.len() + 2);
    all.push(Portal { left: start, right: start });
    all.extend_from_slice(portals);
    all.push(Portal { left: end, right: end });

    let area = |a: Vec3, b: Vec3, c: Vec3| {
        let a2 = plane.project(a);
        (plane.project(b) - a2).cross(plane.project(c) - a2)
    };
    let same = |a: Vec3, b: Vec3| plane.project(a).distance_squared(plane.project(b)) < SAME_POINT_EPSILON_SQ;

    let mut points = vec![start];
    let push = |points: &mut Vec<Vec3>, p: Vec3| {
        if points.last().map_or(true, |last| !same(*last, p)) {
            points.push(p);
        }
    };

    let mut apex = start;
    let mut left = start;
    let mut right = start;
    let mut left_index = 0usize;
    let mut right_index = 0usize;

    let mut i = 1;
    while i < all.len() {
        let pl = all[i].left;
        let pr = all[i].right;

        if area(apex, right, pr) >= 0.0 {
            if same(apex, right) || area(apex, left, pr) < 0.0 {
                right = pr;
                right_index = i;
            } else {
                // Right crossed over left: left becomes a corner.
                apex = left;
                let apex_index = left_index;
                push(&mut points, apex);
                left = apex;
                right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        if area(apex, left, pl) <= 0.0 {
            if same(apex, left) || area(apex, right, pl) > 0.0 {
                left = pl;
                left_index = i;
            } else {
                apex = right;
                let apex_index = right_index;
                push(&mut points, apex);
                left = apex;
                right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        i += 1;
    }

    push(&mut points, end);
    if points.len() == 1 {
        // start and end coincide in the plane; keep both endpoints.
        points.push(end);
    }
    points
}
