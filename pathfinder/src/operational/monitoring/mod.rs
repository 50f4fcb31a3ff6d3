// world_pathfinder/pathfinder/src/operational/monitoring/mod.rs
pub mod metrics;
