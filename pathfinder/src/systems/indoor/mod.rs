// world_pathfinder/pathfinder/src/systems/indoor/mod.rs
pub mod floor_mesh;
pub mod path_graph;
pub mod portal_layout;

pub use floor_mesh::{FloorMesh, FloorMeshData, TriangleRef};
pub use path_graph::{PathGraph, PathNode, PathNodeData, PathNodeKind};
pub use portal_layout::{PathNodeRef, PortalLayout};
