// world_pathfinder/pathfinder/src/systems/pathfinding/spawn.rs
use super::coordinator::{contain_fault, PathFinder};
use crate::concurrent::query_context::NavQueryContext;
use crate::core::error::{PathError, PathResult};
use crate::core::geometry::{Sphere, Vec3};
use crate::operational::monitoring::metrics::{record_failure, record_spawn_attempts};
use crate::world::region::NavMeshRegion;
use crate::world::zone::ZoneQuery;
use tracing::{debug, error};

impl PathFinder {
    /// Random walkable point inside `area`, at terrain height and reachable in a straight line
    /// from the area center.
    pub fn spawn_point_in_area(
        &self,
        ctx: &mut NavQueryContext,
        area: &Sphere,
        zone: &dyn ZoneQuery,
    ) -> PathResult<Vec3> {
        if !area.center.is_finite() || !area.radius.is_finite() || area.radius <= 0.0 {
            record_failure("invalid_input");
            return Err(PathError::InvalidInput(format!("bad spawn area {:?} r={}", area.center, area.radius)));
        }

        let mut regions = zone.regions_overlapping(area.center.x, area.center.y, area.radius);
        regions.truncate(self.config.max_candidate_regions);

        let mut attempts = 0u64;
        let mut found = None;
        for region in &regions {
            let outcome = contain_fault(ctx, "spawn search", |ctx| {
                self.spawn_in_region(ctx, region, area, zone, &mut attempts)
            });
            match outcome {
                Ok(Some(point)) => {
                    found = Some(point);
                    break;
                }
                Ok(None) => {}
                Err(e) => debug!("Region {} skipped for spawning: {}", region.id(), e),
            }
        }
        record_spawn_attempts(attempts);

        found.ok_or_else(|| {
            record_failure("search_exhausted");
            PathError::SearchExhausted(format!(
                "no spawn point around {:?} after {} attempts",
                area.center, attempts
            ))
        })
    }

    fn spawn_in_region(
        &self,
        ctx: &mut NavQueryContext,
        region: &NavMeshRegion,
        area: &Sphere,
        zone: &dyn ZoneQuery,
        attempts: &mut u64,
    ) -> PathResult<Option<Vec3>> {
        let guard = region.navmesh().read();
        let Some(mesh) = guard.as_ref() else {
            error!("Navigation mesh of region {} ({}) is not loaded", region.id(), region.name());
            return Err(PathError::StructuralMissing(format!("region {} has no navmesh", region.id())));
        };
        let Some((center_ref, center_pos)) =
            ctx.query.find_nearest_poly(mesh, area.center, self.config.spawn_extents, &self.spawn_filter)
        else {
            return Ok(None);
        };

        let accept = area.radius * area.radius * self.config.spawn_accept_radius_factor;
        let NavQueryContext { query, rng } = ctx;
        for _ in 0..self.config.spawn_attempts {
            *attempts += 1;
            let Some((_, point)) = query.find_random_point_around_circle(
                mesh,
                center_ref,
                center_pos,
                area.radius,
                &self.spawn_filter,
                rng,
            ) else {
                continue;
            };
            let candidate = Vec3::new(point.x, point.y, zone.terrain_height(point.x, point.y));
            if candidate.xy().distance_squared(area.center.xy()) > accept {
                continue;
            }
            let reachable = query
                .raycast(mesh, center_ref, center_pos, candidate, &self.spawn_filter)
                .map_or(false, |hit| hit.reached());
            if reachable {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}
