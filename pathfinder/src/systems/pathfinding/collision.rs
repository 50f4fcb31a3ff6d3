// world_pathfinder/pathfinder/src/systems/pathfinding/collision.rs
use crate::core::constants::COLLISION_MIN_SEPARATION;
use crate::core::geometry::Vec3;
use crate::world::region::NavMeshRegion;
use std::sync::Arc;
use tracing::trace;

/// Crossing of a travel segment with one region's bounding sphere.
#[derive(Clone, Debug)]
pub struct NavCollision {
    pub position: Vec3,
    /// Ground-plane distance from the segment start.
    pub distance: f32,
    pub region: Arc<NavMeshRegion>,
}

/// Entry and exit points of `start -> end` through each region's bounding sphere on the ground
/// plane, sorted by distance from `start`. Tangent hits count once.
pub fn find_nav_collisions(regions: &[Arc<NavMeshRegion>], start: Vec3, end: Vec3) -> Vec<NavCollision> {
    let delta = end.xy() - start.xy();
    let max_t = delta.length();
    if max_t <= f32::EPSILON {
        return Vec::new();
    }
    let dir = delta * (1.0 / max_t);

    let mut collisions = Vec::new();
    for region in regions {
        let sphere = region.bounding_sphere();
        let to_start = start.xy() - sphere.center.xy();
        let b = to_start.dot(dir);
        let c = to_start.length_squared() - sphere.radius * sphere.radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            continue;
        }
        let root = discriminant.sqrt();
        let t_enter = -b - root;
        let t_exit = -b + root;

        let mut push = |t: f32| {
            if t > 0.0 && t < max_t {
                collisions.push(NavCollision {
                    position: start.lerp(end, t / max_t),
                    distance: t,
                    region: region.clone(),
                });
            }
        };
        if (t_exit - t_enter).abs() > COLLISION_MIN_SEPARATION {
            push(t_enter);
        }
        push(t_exit);
    }

    collisions.sort_by(|a, b| {
        a.distance.total_cmp(&b.distance).then_with(|| a.region.id().cmp(&b.region.id()))
    });
    trace!("Segment {:?} -> {:?} crosses {} region boundaries", start, end, collisions.len());
    collisions
}
