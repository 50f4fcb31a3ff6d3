// world_pathfinder/pathfinder/src/concurrent/mod.rs
pub mod query_context;
pub mod region_index;
pub mod thread_pools;
