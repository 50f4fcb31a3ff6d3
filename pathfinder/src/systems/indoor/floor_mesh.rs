// world_pathfinder/pathfinder/src/systems/indoor/floor_mesh.rs
use super::path_graph::{PathGraph, PathNode, PathNodeData};
use crate::core::constants::TRIANGLE_EDGE_EPSILON;
use crate::core::error::LayoutError;
use crate::core::geometry::{Vec2, Vec3};
use crate::systems::pathfinding::funnel::{string_pull, GroundPlane, Portal};
use ahash::AHashMap;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub type TriangleRef = u32;

/// One floor of a building template, in model space (x/z ground, y up).
/// Cell number 0 is the exterior footprint.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FloorMeshData {
    pub cell_number: u32,
    pub vertices: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
    #[serde(default)]
    pub nodes: Vec<PathNodeData>,
    #[serde(default)]
    pub edges: Vec<[u32; 2]>,
}

#[derive(Clone, Debug)]
pub struct FloorTriangle {
    /// Counter-clockwise on the x/z plane.
    pub verts: [u32; 3],
    /// Neighbour across edge `i` (from `verts[i]` to `verts[(i + 1) % 3]`).
    pub neighbours: [Option<TriangleRef>; 3],
    pub center: Vec3,
    /// Connected-component id; equal ids are mutually reachable.
    pub component: u32,
}

#[derive(Clone, Debug)]
struct TriangleEnvelope {
    triangle: TriangleRef,
    min: [f32; 2],
    max: [f32; 2],
}

impl RTreeObject for TriangleEnvelope {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug)]
struct Frontier {
    estimate: f32,
    triangle: TriangleRef,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.estimate.total_cmp(&self.estimate).then_with(|| other.triangle.cmp(&self.triangle))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct FloorMesh {
    cell_number: u32,
    vertices: Vec<Vec3>,
    triangles: Vec<FloorTriangle>,
    graph: PathGraph,
    tree: RTree<TriangleEnvelope>,
}

impl std::fmt::Debug for FloorMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloorMesh")
            .field("cell_number", &self.cell_number)
            .field("triangles", &self.triangles.len())
            .field("nodes", &self.graph.len())
            .finish()
    }
}

impl FloorMesh {
    pub fn build(data: &FloorMeshData) -> Result<Self, LayoutError> {
        let floor = data.cell_number;
        let vertices: Vec<Vec3> = data.vertices.iter().map(|v| Vec3::from(*v)).collect();

        let mut triangles = Vec::with_capacity(data.triangles.len());
        for (index, tri) in data.triangles.iter().enumerate() {
            for &vi in tri {
                if vi as usize >= vertices.len() {
                    return Err(LayoutError::InvalidTriangle { floor, triangle: index, index: vi });
                }
            }
            let [a, b, c] = tri.map(|v| vertices[v as usize]);
            let area = (b.xz() - a.xz()).cross(c.xz() - a.xz());
            if area.abs() <= f32::EPSILON {
                return Err(LayoutError::DegenerateTriangle { floor, triangle: index });
            }
            let verts = if area < 0.0 { [tri[0], tri[2], tri[1]] } else { *tri };
            triangles.push(FloorTriangle {
                verts,
                neighbours: [None; 3],
                center: (a + b + c) * (1.0 / 3.0),
                component: u32::MAX,
            });
        }

        let mut open_edges: AHashMap<(u32, u32), (TriangleRef, usize)> = AHashMap::new();
        for ti in 0..triangles.len() {
            for e in 0..3 {
                let a = triangles[ti].verts[e];
                let b = triangles[ti].verts[(e + 1) % 3];
                let key = (a.min(b), a.max(b));
                if let Some((other, other_edge)) = open_edges.remove(&key) {
                    triangles[ti].neighbours[e] = Some(other);
                    triangles[other as usize].neighbours[other_edge] = Some(ti as TriangleRef);
                } else {
                    open_edges.insert(key, (ti as TriangleRef, e));
                }
            }
        }

        // Flood-fill connected components.
        let mut component = 0;
        for seed in 0..triangles.len() {
            if triangles[seed].component != u32::MAX {
                continue;
            }
            let mut stack = vec![seed];
            triangles[seed].component = component;
            while let Some(t) = stack.pop() {
                for n in triangles[t].neighbours.into_iter().flatten() {
                    if triangles[n as usize].component == u32::MAX {
                        triangles[n as usize].component = component;
                        stack.push(n as usize);
                    }
                }
            }
            component += 1;
        }

        let envelopes = triangles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let [a, b, c] = t.verts.map(|v| vertices[v as usize].xz());
                TriangleEnvelope {
                    triangle: i as TriangleRef,
                    min: [a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y)],
                    max: [a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y)],
                }
            })
            .collect();

        let mut mesh = FloorMesh {
            cell_number: floor,
            vertices,
            triangles,
            graph: PathGraph::build(floor, &data.nodes, &data.edges)?,
            tree: RTree::bulk_load(envelopes),
        };

        let anchors: Vec<Option<TriangleRef>> =
            mesh.graph.nodes().iter().map(|n| mesh.find_triangle(n.position)).collect();
        for (i, tri) in anchors.into_iter().enumerate() {
            mesh.graph.set_triangle(i, tri);
        }
        Ok(mesh)
    }

    pub fn cell_number(&self) -> u32 { self.cell_number }
    pub fn graph(&self) -> &PathGraph { &self.graph }
    pub fn triangle_count(&self) -> usize { self.triangles.len() }
    pub fn triangle(&self, t: TriangleRef) -> Option<&FloorTriangle> { self.triangles.get(t as usize) }

    fn corners(&self, t: &FloorTriangle) -> [Vec3; 3] {
        t.verts.map(|v| self.vertices[v as usize])
    }

    fn contains_xz(&self, t: &FloorTriangle, p: Vec2) -> bool {
        let corners = self.corners(t);
        (0..3).all(|i| {
            let a = corners[i].xz();
            let b = corners[(i + 1) % 3].xz();
            let edge = b - a;
            let len = edge.length();
            len > 0.0 && edge.cross(p - a) / len >= -TRIANGLE_EDGE_EPSILON
        })
    }

    /// Triangle containing `p` on the ground plane; the lowest index wins on shared edges.
    pub fn find_triangle(&self, p: Vec3) -> Option<TriangleRef> {
        let q = p.xz();
        let e = TRIANGLE_EDGE_EPSILON;
        let query = AABB::from_corners([q.x - e, q.y - e], [q.x + e, q.y + e]);
        self.tree
            .locate_in_envelope_intersecting(&query)
            .filter(|env| self.contains_xz(&self.triangles[env.triangle as usize], q))
            .map(|env| env.triangle)
            .min()
    }

    pub fn connected(&self, a: TriangleRef, b: TriangleRef) -> bool {
        match (self.triangle(a), self.triangle(b)) {
            (Some(ta), Some(tb)) => ta.component == tb.component,
            _ => false,
        }
    }

    /// A* over triangle adjacency, Euclidean heuristic.
    pub fn find_triangle_path(
        &self,
        start_tri: TriangleRef,
        end_tri: TriangleRef,
        start: Vec3,
        end: Vec3,
    ) -> Option<Vec<TriangleRef>> {
        if !self.connected(start_tri, end_tri) {
            return None;
        }
        if start_tri == end_tri {
            return Some(vec![start_tri]);
        }

        let n = self.triangles.len();
        let mut cost = vec![f32::INFINITY; n];
        let mut parent: Vec<Option<TriangleRef>> = vec![None; n];
        let mut closed = vec![false; n];
        let point_of = |t: TriangleRef| -> Vec3 {
            if t == start_tri {
                start
            } else if t == end_tri {
                end
            } else {
                self.triangles[t as usize].center
            }
        };

        let mut open = BinaryHeap::new();
        cost[start_tri as usize] = 0.0;
        open.push(Frontier { estimate: start.distance(end), triangle: start_tri });

        while let Some(Frontier { triangle, .. }) = open.pop() {
            if closed[triangle as usize] {
                continue;
            }
            closed[triangle as usize] = true;
            if triangle == end_tri {
                let mut route = vec![end_tri];
                let mut cursor = parent[end_tri as usize];
                while let Some(t) = cursor {
                    route.push(t);
                    cursor = parent[t as usize];
                }
                route.reverse();
                return Some(route);
            }
            let here = point_of(triangle);
            for next in self.triangles[triangle as usize].neighbours.into_iter().flatten() {
                if closed[next as usize] {
                    continue;
                }
                let there = point_of(next);
                let g = cost[triangle as usize] + here.distance(there);
                if g < cost[next as usize] {
                    cost[next as usize] = g;
                    parent[next as usize] = Some(triangle);
                    open.push(Frontier { estimate: g + there.distance(end), triangle: next });
                }
            }
        }
        None
    }

    /// Interior corner points of the taut path through `corridor`, excluding `start` and `end`.
    pub fn smooth(&self, start: Vec3, end: Vec3, corridor: &[TriangleRef]) -> Vec<Vec3> {
        let mut portals = Vec::with_capacity(corridor.len().saturating_sub(1));
        for pair in corridor.windows(2) {
            let Some(tri) = self.triangle(pair[0]) else { continue };
            let Some(edge) = tri.neighbours.iter().position(|n| *n == Some(pair[1])) else { continue };
            let va = self.vertices[tri.verts[edge] as usize];
            let vb = self.vertices[tri.verts[(edge + 1) % 3] as usize];
            portals.push(Portal { left: vb, right: va });
        }
        let mut points = string_pull(start, &portals, end, GroundPlane::Xz);
        if points.len() <= 2 {
            return Vec::new();
        }
        points.pop();
        points.remove(0);
        points
    }

    /// Fine path between two points of this floor: `[start, corners.., end]`.
    pub fn find_path(&self, start: Vec3, end: Vec3) -> Option<Vec<Vec3>> {
        let start_tri = self.find_triangle(start)?;
        let end_tri = self.find_triangle(end)?;
        if start_tri == end_tri {
            return Some(vec![start, end]);
        }
        let corridor = self.find_triangle_path(start_tri, end_tri, start, end)?;
        let mut points = Vec::with_capacity(corridor.len() + 2);
        points.push(start);
        points.extend(self.smooth(start, end, &corridor));
        points.push(end);
        Some(points)
    }

    /// Anchor node closest to `target` among those reachable from `triangle`.
    pub fn nearest_reachable_node(&self, triangle: TriangleRef, target: Vec3) -> Option<&PathNode> {
        let component = self.triangle(triangle)?.component;
        self.graph
            .nodes()
            .iter()
            .filter(|n| n.triangle.and_then(|t| self.triangle(t)).map_or(false, |t| t.component == component))
            .min_by(|a, b| {
                a.position.distance_squared(target).total_cmp(&b.position.distance_squared(target))
            })
    }

    /// Closest node that is shared with another floor.
    pub fn nearest_global_node(&self, target: Vec3) -> Option<&PathNode> {
        self.graph
            .nodes()
            .iter()
            .filter(|n| n.global_id.is_some())
            .min_by(|a, b| {
                a.position.distance_squared(target).total_cmp(&b.position.distance_squared(target))
            })
    }
}
