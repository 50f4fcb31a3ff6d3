// world_pathfinder/pathfinder/src/core/constants.rs
use super::geometry::Vec3;

// Search budgets
pub const MAX_SEARCH_NODES: usize = 2048;
pub const MAX_POLY_PATH: usize = 2048;
pub const MAX_STRAIGHT_PATH: usize = 128;
pub const MAX_CANDIDATE_REGIONS: usize = 16;
pub const MAX_VERTS_PER_POLY: usize = 6;

// Nearest-polygon search boxes (half extents, world axes)
pub const PATH_EXTENTS: Vec3 = Vec3::new(2.0, 2.0, 4.0);
pub const SPAWN_EXTENTS: Vec3 = Vec3::new(3.0, 3.0, 5.0);

// Region bounds
pub const REGION_BOUNDS_RADIUS_FACTOR: f32 = 0.975;
pub const COLLISION_MIN_SEPARATION: f32 = 0.1;

// Spawn search
pub const SPAWN_ATTEMPTS: usize = 50;
pub const SPAWN_ACCEPT_RADIUS_FACTOR: f32 = 1.5;

// Area traversal costs
pub const AREA_COST_GROUND: f32 = 1.0;
pub const AREA_COST_WATER: f32 = 15.0;
pub const AREA_COST_ROAD: f32 = 1.0;
pub const AREA_COST_DOOR: f32 = 1.0;
pub const AREA_COST_GRASS: f32 = 2.0;
pub const AREA_COST_JUMP: f32 = 1.5;

// Tolerances
pub const GOAL_SNAP_EPSILON: f32 = 1e-3;
pub const POINT_ON_PATH_EPSILON: f32 = 1e-4;
pub const TRIANGLE_EDGE_EPSILON: f32 = 1e-3;
pub const HEURISTIC_SCALE: f32 = 0.999;

// Worker pool
pub const POOL_THREAD_PREFIX: &str = "pathfinding";
pub const DEFAULT_METRICS_PORT: u16 = 9090;
