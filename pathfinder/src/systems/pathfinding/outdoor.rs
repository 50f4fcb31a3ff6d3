// world_pathfinder/pathfinder/src/systems/pathfinding/outdoor.rs
use super::collision::find_nav_collisions;
use super::coordinator::{contain_fault, PathFinder};
use crate::concurrent::query_context::NavQueryContext;
use crate::core::constants::GOAL_SNAP_EPSILON;
use crate::core::error::{PathError, PathResult};
use crate::core::geometry::Vec3;
use crate::core::types::{Path, PathOutcome, WorldCoordinates};
use crate::world::region::NavMeshRegion;
use crate::world::zone::ZoneQuery;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Waypoints of one search inside a single region.
struct MeshLeg {
    points: Vec<Vec3>,
    partial: bool,
}

impl PathFinder {
    /// Shortest outdoor route from `start` to any of `goals`. `SearchExhausted` when no region
    /// leg produced a usable candidate; the caller decides on the fallback.
    pub(crate) fn find_outdoor(
        &self,
        ctx: &mut NavQueryContext,
        start: &WorldCoordinates,
        goals: &[WorldCoordinates],
        zone: &dyn ZoneQuery,
        allow_partial: bool,
    ) -> PathResult<Path> {
        let mut best: Option<(f32, Path)> = None;
        let from = start.position;

        for goal in goals {
            let to = goal.position;
            let middle = from.lerp(to, 0.5);
            let mut regions = zone.regions_overlapping(middle.x, middle.y, from.distance(to));
            regions.truncate(self.config.max_candidate_regions);
            if regions.is_empty() {
                trace!("No navigation regions around {:?} -> {:?}", from, to);
                continue;
            }

            let collisions = find_nav_collisions(&regions, from, to);
            if let [entry] = collisions.as_slice() {
                let crossing = entry.position;
                let entry_point = Vec3::new(crossing.x, crossing.y, zone.terrain_height(crossing.x, crossing.y));
                if let Some(leg) = self.region_leg(ctx, &entry.region, entry_point, to, allow_partial) {
                    consider(&mut best, assemble(start, goal, leg, false));
                }
                continue;
            }

            for region in &regions {
                if !region.contains_xy(from.xy()) && !region.contains_xy(to.xy()) {
                    continue;
                }
                if let Some(leg) = self.region_leg(ctx, region, from, to, allow_partial) {
                    consider(&mut best, assemble(start, goal, leg, true));
                }
            }
        }

        best.map(|(_, path)| path)
            .ok_or_else(|| PathError::SearchExhausted(format!("no outdoor route from {:?}", from)))
    }

    fn region_leg(
        &self,
        ctx: &mut NavQueryContext,
        region: &Arc<NavMeshRegion>,
        from: Vec3,
        to: Vec3,
        allow_partial: bool,
    ) -> Option<MeshLeg> {
        match contain_fault(ctx, "outdoor mesh search", |ctx| self.mesh_leg(ctx, region, from, to, allow_partial)) {
            Ok(leg) => Some(leg),
            Err(e) => {
                debug!("Region {} ({}) leg skipped: {}", region.id(), region.name(), e);
                None
            }
        }
    }

    fn mesh_leg(
        &self,
        ctx: &mut NavQueryContext,
        region: &NavMeshRegion,
        from: Vec3,
        to: Vec3,
        allow_partial: bool,
    ) -> PathResult<MeshLeg> {
        let guard = region.navmesh().read();
        let Some(mesh) = guard.as_ref() else {
            error!("Navigation mesh of region {} ({}) is not loaded", region.id(), region.name());
            return Err(PathError::StructuralMissing(format!("region {} has no navmesh", region.id())));
        };

        let extents = self.config.path_extents;
        let (start_ref, start_pos) = ctx
            .query
            .find_nearest_poly(mesh, from, extents, &self.path_filter)
            .ok_or_else(|| PathError::SearchExhausted(format!("start {:?} is off the navmesh", from)))?;
        let (end_ref, end_pos) = ctx
            .query
            .find_nearest_poly(mesh, to, extents, &self.path_filter)
            .ok_or_else(|| PathError::SearchExhausted(format!("goal {:?} is off the navmesh", to)))?;

        let corridor =
            ctx.query.find_path(mesh, start_ref, end_ref, start_pos, end_pos, &self.path_filter, self.config.max_poly_path)?;
        if corridor.partial && !allow_partial {
            return Err(PathError::SearchExhausted(format!(
                "polygon {} unreachable from {}",
                end_ref, start_ref
            )));
        }

        let straight = ctx.query.find_straight_path(mesh, start_pos, end_pos, &corridor.polys, self.config.max_straight_path)?;
        if straight.truncated && !allow_partial {
            return Err(PathError::SearchExhausted("straight path exceeds the waypoint limit".to_string()));
        }
        Ok(MeshLeg { points: straight.points, partial: corridor.partial || straight.truncated })
    }
}

fn assemble(start: &WorldCoordinates, goal: &WorldCoordinates, leg: MeshLeg, leg_from_start: bool) -> Path {
    let mut points = Vec::with_capacity(leg.points.len() + 2);
    points.push(start.clone());
    let skip = usize::from(leg_from_start);
    points.extend(leg.points.into_iter().skip(skip).map(WorldCoordinates::world));

    if leg.partial {
        return Path::new(points, PathOutcome::Partial);
    }
    let snaps = points.len() > 1
        && points.last().map_or(false, |last| last.position.distance(goal.position) <= GOAL_SNAP_EPSILON);
    if snaps {
        points.pop();
    }
    points.push(goal.clone());
    Path::new(points, PathOutcome::Complete)
}

fn consider(best: &mut Option<(f32, Path)>, candidate: Path) {
    let length = candidate.length();
    if length <= 0.0 {
        return;
    }
    if best.as_ref().map_or(true, |(shortest, _)| length < *shortest) {
        *best = Some((length, candidate));
    }
}
