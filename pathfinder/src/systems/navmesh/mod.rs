// world_pathfinder/pathfinder/src/systems/navmesh/mod.rs
pub mod mesh;
pub mod query;

pub use mesh::{AreaClass, NavMesh, NavMeshData, NavPoly, NavPolyData, PolyRef, QueryFilter};
pub use query::{NavMeshQuery, PolyPath, RaycastHit, StraightPath};
