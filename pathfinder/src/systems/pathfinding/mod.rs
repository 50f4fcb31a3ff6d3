// world_pathfinder/pathfinder/src/systems/pathfinding/mod.rs
pub mod collision;
pub mod coordinator;
pub mod funnel;
pub mod indoor;
pub mod outdoor;
pub mod spawn;

pub use collision::{find_nav_collisions, NavCollision};
pub use coordinator::{PathFinder, Regime};
pub use funnel::{string_pull, GroundPlane, Portal};
