// world_pathfinder/pathfinder/src/systems/indoor/portal_layout.rs
use super::floor_mesh::{FloorMesh, FloorMeshData};
use super::path_graph::PathNode;
use crate::core::error::LayoutError;
use crate::core::geometry::Vec3;
use ahash::{AHashMap, AHashSet};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::debug;

/// Anchor node of a specific floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathNodeRef {
    pub cell_number: u32,
    pub node: u32,
}

impl PathNodeRef {
    pub fn new(cell_number: u32, node: u32) -> Self {
        PathNodeRef { cell_number, node }
    }
}

#[derive(Clone, Copy, Debug)]
struct Frontier {
    estimate: f32,
    node: PathNodeRef,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.estimate.total_cmp(&self.estimate).then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// All floors of a building template plus the links between them.
pub struct PortalLayout {
    name: String,
    floors: BTreeMap<u32, FloorMesh>,
    twins: AHashMap<u32, SmallVec<[PathNodeRef; 4]>>,
}

impl std::fmt::Debug for PortalLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalLayout")
            .field("name", &self.name)
            .field("floors", &self.floors.len())
            .finish()
    }
}

impl PortalLayout {
    pub fn build(name: impl Into<String>, floors: &[FloorMeshData]) -> Result<Self, LayoutError> {
        let name = name.into();
        let mut built = BTreeMap::new();
        for data in floors {
            if built.contains_key(&data.cell_number) {
                return Err(LayoutError::DuplicateFloor(data.cell_number));
            }
            built.insert(data.cell_number, FloorMesh::build(data)?);
        }
        if !built.contains_key(&0) {
            return Err(LayoutError::MissingExteriorFloor(name));
        }

        let mut twins: AHashMap<u32, SmallVec<[PathNodeRef; 4]>> = AHashMap::new();
        for (&cell_number, floor) in &built {
            for node in floor.graph().nodes() {
                if let Some(global) = node.global_id {
                    twins.entry(global).or_default().push(PathNodeRef::new(cell_number, node.index));
                }
            }
        }

        debug!("Portal layout '{}' built: {} floors, {} shared portals", name, built.len(), twins.len());
        Ok(PortalLayout { name, floors: built, twins })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn floor(&self, cell_number: u32) -> Option<&FloorMesh> { self.floors.get(&cell_number) }
    pub fn floor_count(&self) -> usize { self.floors.len() }

    /// Floor numbers in ascending order, exterior first.
    pub fn cell_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.floors.keys().copied()
    }

    pub fn node(&self, r: PathNodeRef) -> Option<&PathNode> {
        self.floor(r.cell_number)?.graph().node(r.node)
    }

    /// Anchor on the exterior floor to use for a model-space point outside (or at the edge of)
    /// the building: the nearest reachable node when the point is on the exterior mesh,
    /// otherwise the nearest shared node.
    pub fn exterior_anchor(&self, model_point: Vec3) -> Option<PathNodeRef> {
        let exterior = self.floor(0)?;
        let node = match exterior.find_triangle(model_point) {
            Some(tri) => exterior
                .nearest_reachable_node(tri, model_point)
                .or_else(|| exterior.nearest_global_node(model_point)),
            None => exterior.nearest_global_node(model_point),
        }?;
        Some(PathNodeRef::new(0, node.index))
    }

    fn neighbours(&self, r: PathNodeRef) -> SmallVec<[PathNodeRef; 8]> {
        let mut out = SmallVec::new();
        let Some(floor) = self.floor(r.cell_number) else { return out };
        out.extend(floor.graph().neighbours(r.node).iter().map(|&n| PathNodeRef::new(r.cell_number, n)));
        if let Some(global) = floor.graph().node(r.node).and_then(|n| n.global_id) {
            if let Some(twins) = self.twins.get(&global) {
                out.extend(twins.iter().copied().filter(|t| *t != r));
            }
        }
        out
    }

    /// Shortest anchor-node route between two nodes anywhere in the building, both ends included.
    pub fn path(&self, from: PathNodeRef, to: PathNodeRef) -> Option<Vec<PathNodeRef>> {
        let goal = self.node(to)?.position;
        let start = self.node(from)?.position;
        if from == to {
            return Some(vec![from]);
        }

        let mut cost: AHashMap<PathNodeRef, f32> = AHashMap::new();
        let mut parent: AHashMap<PathNodeRef, PathNodeRef> = AHashMap::new();
        let mut closed: AHashSet<PathNodeRef> = AHashSet::new();
        let mut open = BinaryHeap::new();
        cost.insert(from, 0.0);
        open.push(Frontier { estimate: start.distance(goal), node: from });

        while let Some(Frontier { node, .. }) = open.pop() {
            if !closed.insert(node) {
                continue;
            }
            if node == to {
                let mut route = vec![to];
                let mut cursor = to;
                while let Some(&prev) = parent.get(&cursor) {
                    route.push(prev);
                    cursor = prev;
                }
                route.reverse();
                return Some(route);
            }
            let Some(here) = self.node(node).map(|n| n.position) else { continue };
            let g_here = cost.get(&node).copied().unwrap_or(f32::INFINITY);
            for next in self.neighbours(node) {
                if closed.contains(&next) {
                    continue;
                }
                let Some(there) = self.node(next).map(|n| n.position) else { continue };
                let g = g_here + here.distance(there);
                if g < cost.get(&next).copied().unwrap_or(f32::INFINITY) {
                    cost.insert(next, g);
                    parent.insert(next, node);
                    open.push(Frontier { estimate: g + there.distance(goal), node: next });
                }
            }
        }
        None
    }
}
