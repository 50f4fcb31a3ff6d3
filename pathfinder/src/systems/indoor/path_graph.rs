// world_pathfinder/pathfinder/src/systems/indoor/path_graph.rs
use crate::core::error::LayoutError;
use crate::core::geometry::Vec3;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PathNodeKind {
    #[default]
    Waypoint,
    /// Doorway or stair linking two cells of the same building.
    CellPortal,
    /// Link between the building's exterior floor and its interior.
    BuildingEntrance,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PathNodeData {
    pub id: u32,
    pub position: [f32; 3],
    #[serde(default)]
    pub kind: PathNodeKind,
    /// Nodes on different floors sharing a global id are the same physical portal.
    #[serde(default)]
    pub global_id: Option<u32>,
}

/// Anchor node of a floor, in building model space.
#[derive(Clone, Debug, PartialEq)]
pub struct PathNode {
    pub id: u32,
    pub index: u32,
    pub position: Vec3,
    pub kind: PathNodeKind,
    pub global_id: Option<u32>,
    /// Floor triangle under the node, if any.
    pub triangle: Option<u32>,
}

/// Coarse routing graph of one floor.
#[derive(Clone, Debug, Default)]
pub struct PathGraph {
    nodes: Vec<PathNode>,
    adjacency: Vec<SmallVec<[u32; 4]>>,
}

impl PathGraph {
    /// `edges` connect node ids, both directions.
    pub fn build(floor: u32, nodes: &[PathNodeData], edges: &[[u32; 2]]) -> Result<Self, LayoutError> {
        let mut by_id: AHashMap<u32, u32> = AHashMap::with_capacity(nodes.len());
        let mut graph_nodes = Vec::with_capacity(nodes.len());
        for (index, data) in nodes.iter().enumerate() {
            if by_id.insert(data.id, index as u32).is_some() {
                return Err(LayoutError::DuplicateNode { floor, node: data.id });
            }
            graph_nodes.push(PathNode {
                id: data.id,
                index: index as u32,
                position: Vec3::from(data.position),
                kind: data.kind,
                global_id: data.global_id,
                triangle: None,
            });
        }

        let mut adjacency: Vec<SmallVec<[u32; 4]>> = vec![SmallVec::new(); graph_nodes.len()];
        for [a, b] in edges {
            let ia = *by_id.get(a).ok_or(LayoutError::InvalidEdge { floor, node: *a })?;
            let ib = *by_id.get(b).ok_or(LayoutError::InvalidEdge { floor, node: *b })?;
            if ia == ib {
                continue;
            }
            if !adjacency[ia as usize].contains(&ib) {
                adjacency[ia as usize].push(ib);
            }
            if !adjacency[ib as usize].contains(&ia) {
                adjacency[ib as usize].push(ia);
            }
        }

        Ok(PathGraph { nodes: graph_nodes, adjacency })
    }

    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
    pub fn nodes(&self) -> &[PathNode] { &self.nodes }
    pub fn node(&self, index: u32) -> Option<&PathNode> { self.nodes.get(index as usize) }

    pub fn neighbours(&self, index: u32) -> &[u32] {
        self.adjacency.get(index as usize).map(|n| n.as_slice()).unwrap_or(&[])
    }

    pub fn find_by_id(&self, id: u32) -> Option<&PathNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn set_triangle(&mut self, index: usize, triangle: Option<u32>) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.triangle = triangle;
        }
    }
}
