// world_pathfinder/pathfinder/src/lib.rs

pub mod core;
pub mod concurrent;
pub mod world;
pub mod operational;
pub mod systems;

pub use crate::concurrent::query_context::NavQueryContext;
pub use crate::concurrent::thread_pools::{PathRequest, PathfindingPool};
pub use crate::core::config::PathfinderConfig;
pub use crate::core::error::{PathError, PathResult};
pub use crate::core::types::{Path, PathOutcome, WorldCoordinates};
pub use crate::systems::pathfinding::PathFinder;
pub use crate::world::zone::{Zone, ZoneQuery};
