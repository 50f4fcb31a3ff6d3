// world_pathfinder/pathfinder/src/core/mod.rs
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod types;
