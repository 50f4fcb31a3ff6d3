// world_pathfinder/pathfinder/src/operational/mod.rs
pub mod monitoring;
