// world_pathfinder/pathfinder/src/systems/mod.rs
pub mod indoor;
pub mod navmesh;
pub mod pathfinding;
