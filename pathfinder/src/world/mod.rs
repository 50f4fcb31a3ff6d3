// world_pathfinder/pathfinder/src/world/mod.rs
pub mod building;
pub mod loader;
pub mod region;
pub mod zone;
