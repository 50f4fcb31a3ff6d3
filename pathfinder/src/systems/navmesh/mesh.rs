// world_pathfinder/pathfinder/src/systems/navmesh/mesh.rs
use crate::core::config::AreaCostConfig;
use crate::core::constants::MAX_VERTS_PER_POLY;
use crate::core::error::NavMeshError;
use crate::core::geometry::{Aabb, Segment, Vec2, Vec3};
use ahash::AHashMap;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index of a polygon inside one `NavMesh`.
pub type PolyRef = u32;

// --- Polygon flags ---
pub const POLY_FLAG_WALK: u16 = 1 << 0;
pub const POLY_FLAG_SWIM: u16 = 1 << 1;
pub const POLY_FLAG_DOOR: u16 = 1 << 2;
pub const POLY_FLAG_JUMP: u16 = 1 << 3;
pub const POLY_FLAG_DISABLED: u16 = 1 << 4;
pub const POLY_FLAGS_ALL: u16 = 0xffff;

const INSIDE_EPSILON: f32 = 1e-4;

/// Terrain class of a polygon; selects its traversal cost.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AreaClass {
    #[default]
    Ground,
    Water,
    Road,
    Door,
    Grass,
    Jump,
}

impl AreaClass {
    pub const COUNT: usize = 6;

    pub fn index(self) -> usize {
        match self {
            AreaClass::Ground => 0,
            AreaClass::Water => 1,
            AreaClass::Road => 2,
            AreaClass::Door => 3,
            AreaClass::Grass => 4,
            AreaClass::Jump => 5,
        }
    }

    pub fn default_flags(self) -> u16 {
        match self {
            AreaClass::Water => POLY_FLAG_SWIM,
            AreaClass::Door => POLY_FLAG_WALK | POLY_FLAG_DOOR,
            AreaClass::Jump => POLY_FLAG_JUMP,
            AreaClass::Ground | AreaClass::Road | AreaClass::Grass => POLY_FLAG_WALK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavPolyData {
    pub vertices: Vec<u32>,
    #[serde(default)]
    pub area: AreaClass,
    #[serde(default)]
    pub disabled: bool,
}

/// Serialized navigation mesh: shared vertices plus convex polygons indexing them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NavMeshData {
    pub vertices: Vec<[f32; 3]>,
    pub polygons: Vec<NavPolyData>,
}

impl NavMeshData {
    /// Flat grid of `cols` x `rows` square ground polygons starting at `origin`.
    pub fn grid(origin: Vec3, cell_size: f32, cols: u32, rows: u32) -> Self {
        let mut vertices = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
        for j in 0..=rows {
            for i in 0..=cols {
                vertices.push([
                    origin.x + i as f32 * cell_size,
                    origin.y + j as f32 * cell_size,
                    origin.z,
                ]);
            }
        }
        let stride = cols + 1;
        let mut polygons = Vec::with_capacity((cols * rows) as usize);
        for j in 0..rows {
            for i in 0..cols {
                let v0 = j * stride + i;
                polygons.push(NavPolyData {
                    vertices: vec![v0, v0 + 1, v0 + stride + 1, v0 + stride],
                    area: AreaClass::Ground,
                    disabled: false,
                });
            }
        }
        NavMeshData { vertices, polygons }
    }

    /// Polygon index of grid cell (`col`, `row`) for data built by [`NavMeshData::grid`].
    pub fn grid_poly(cols: u32, col: u32, row: u32) -> usize {
        (row * cols + col) as usize
    }
}

#[derive(Clone, Debug)]
pub struct NavPoly {
    /// Vertex indices, counter-clockwise on the ground plane.
    pub verts: SmallVec<[u32; MAX_VERTS_PER_POLY]>,
    /// Neighbour across edge `i` (from `verts[i]` to `verts[i + 1]`).
    pub neighbours: SmallVec<[Option<PolyRef>; MAX_VERTS_PER_POLY]>,
    pub flags: u16,
    pub area: AreaClass,
    pub center: Vec3,
    pub ground_area: f32,
}

#[derive(Clone, Debug)]
struct PolyEnvelope {
    poly: PolyRef,
    min: [f32; 3],
    max: [f32; 3],
}

impl RTreeObject for PolyEnvelope {
    type Envelope = AABB<[f32; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

pub struct NavMesh {
    vertices: Vec<Vec3>,
    polys: Vec<NavPoly>,
    bounds: Aabb,
    tree: RTree<PolyEnvelope>,
}

impl std::fmt::Debug for NavMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavMesh")
            .field("vertices", &self.vertices.len())
            .field("polys", &self.polys.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}

fn signed_area_xy(points: &[Vec3]) -> f32 {
    let mut area = 0.0;
    for i in 0..points.len() {
        let a = points[i].xy();
        let b = points[(i + 1) % points.len()].xy();
        area += a.cross(b);
    }
    area * 0.5
}

impl NavMesh {
    pub fn build(data: &NavMeshData) -> Result<NavMesh, NavMeshError> {
        if data.polygons.is_empty() {
            return Err(NavMeshError::Empty);
        }
        let vertices: Vec<Vec3> = data.vertices.iter().map(|v| Vec3::from(*v)).collect();

        let mut polys = Vec::with_capacity(data.polygons.len());
        for (index, poly_data) in data.polygons.iter().enumerate() {
            let count = poly_data.vertices.len();
            if !(3..=MAX_VERTS_PER_POLY).contains(&count) {
                return Err(NavMeshError::BadVertexCount { poly: index, count, max: MAX_VERTS_PER_POLY });
            }
            let mut verts: SmallVec<[u32; MAX_VERTS_PER_POLY]> = SmallVec::new();
            for &vi in &poly_data.vertices {
                if vi as usize >= vertices.len() {
                    return Err(NavMeshError::InvalidVertexIndex { poly: index, index: vi });
                }
                verts.push(vi);
            }
            let points: SmallVec<[Vec3; MAX_VERTS_PER_POLY]> =
                verts.iter().map(|&v| vertices[v as usize]).collect();
            let mut ground_area = signed_area_xy(&points);
            if ground_area.abs() <= f32::EPSILON {
                return Err(NavMeshError::DegeneratePolygon(index));
            }
            if ground_area < 0.0 {
                verts.reverse();
                ground_area = -ground_area;
            }
            let center = points.iter().fold(Vec3::zero(), |acc, p| acc + *p) * (1.0 / count as f32);
            let flags = if poly_data.disabled { POLY_FLAG_DISABLED } else { poly_data.area.default_flags() };

            polys.push(NavPoly {
                neighbours: SmallVec::from_elem(None, verts.len()),
                verts,
                flags,
                area: poly_data.area,
                center,
                ground_area,
            });
        }

        // Link polygons sharing an edge.
        let mut edges: AHashMap<(u32, u32), (PolyRef, usize)> = AHashMap::new();
        for pi in 0..polys.len() {
            let n = polys[pi].verts.len();
            for e in 0..n {
                let a = polys[pi].verts[e];
                let b = polys[pi].verts[(e + 1) % n];
                let key = (a.min(b), a.max(b));
                if let Some((other, other_edge)) = edges.remove(&key) {
                    polys[pi].neighbours[e] = Some(other);
                    polys[other as usize].neighbours[other_edge] = Some(pi as PolyRef);
                } else {
                    edges.insert(key, (pi as PolyRef, e));
                }
            }
        }

        let envelopes: Vec<PolyEnvelope> = polys
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let b = Aabb::from_points(p.verts.iter().map(|&v| vertices[v as usize]))?;
                Some(PolyEnvelope { poly: i as PolyRef, min: b.min.to_array(), max: b.max.to_array() })
            })
            .collect();

        let bounds = Aabb::from_points(polys.iter().flat_map(|p| p.verts.iter().map(|&v| vertices[v as usize])))
            .ok_or(NavMeshError::Empty)?;

        Ok(NavMesh {
            vertices,
            polys,
            bounds,
            tree: RTree::bulk_load(envelopes),
        })
    }

    pub fn bounds(&self) -> Aabb { self.bounds }
    pub fn poly_count(&self) -> usize { self.polys.len() }
    pub fn poly(&self, poly: PolyRef) -> Option<&NavPoly> { self.polys.get(poly as usize) }

    pub fn poly_vertices(&self, poly: &NavPoly) -> SmallVec<[Vec3; MAX_VERTS_PER_POLY]> {
        poly.verts.iter().map(|&v| self.vertices[v as usize]).collect()
    }

    /// Polygons whose bounds overlap the box `center +- half_extents`.
    pub fn polys_in_box(&self, center: Vec3, half_extents: Vec3) -> Vec<PolyRef> {
        let min = center - half_extents;
        let max = center + half_extents;
        let query = AABB::from_corners(min.to_array(), max.to_array());
        self.tree
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.poly)
            .collect()
    }

    /// Left and right endpoints of the edge crossed when moving from `from` into `to`.
    pub fn portal_points(&self, from: PolyRef, to: PolyRef) -> Option<(Vec3, Vec3)> {
        let poly = self.poly(from)?;
        let edge = poly.neighbours.iter().position(|n| *n == Some(to))?;
        let n = poly.verts.len();
        let va = self.vertices[poly.verts[edge] as usize];
        let vb = self.vertices[poly.verts[(edge + 1) % n] as usize];
        Some((vb, va))
    }

    pub fn contains_xy(&self, poly: &NavPoly, p: Vec2) -> bool {
        let points = self.poly_vertices(poly);
        let n = points.len();
        (0..n).all(|i| {
            let a = points[i].xy();
            let b = points[(i + 1) % n].xy();
            (b - a).cross(p - a) >= -INSIDE_EPSILON
        })
    }

    /// Surface height of `poly` at ground position `p`, if `p` lies over it.
    pub fn height_at(&self, poly: &NavPoly, p: Vec2) -> Option<f32> {
        let points = self.poly_vertices(poly);
        let v0 = points[0];
        for i in 1..points.len() - 1 {
            let (v1, v2) = (points[i], points[i + 1]);
            let d = (v1.xy() - v0.xy()).cross(v2.xy() - v0.xy());
            if d.abs() <= f32::EPSILON {
                continue;
            }
            let u = (p - v0.xy()).cross(v2.xy() - v0.xy()) / d;
            let v = (v1.xy() - v0.xy()).cross(p - v0.xy()) / d;
            if u >= -INSIDE_EPSILON && v >= -INSIDE_EPSILON && u + v <= 1.0 + INSIDE_EPSILON {
                return Some(v0.z + (v1.z - v0.z) * u + (v2.z - v0.z) * v);
            }
        }
        None
    }

    pub fn closest_point_on_poly(&self, poly: &NavPoly, p: Vec3) -> Vec3 {
        if self.contains_xy(poly, p.xy()) {
            let z = self.height_at(poly, p.xy()).unwrap_or(poly.center.z);
            return Vec3::new(p.x, p.y, z);
        }
        let points = self.poly_vertices(poly);
        let n = points.len();
        let mut best = points[0];
        let mut best_dist = f32::MAX;
        for i in 0..n {
            let edge = Segment::new(points[i], points[(i + 1) % n]);
            let t = edge.closest_param_xy(p.xy());
            let candidate = edge.point_at(t);
            let d = candidate.xy().distance_squared(p.xy());
            if d < best_dist {
                best_dist = d;
                best = candidate;
            }
        }
        best
    }
}

/// Which polygons a query may cross and what each area class costs.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryFilter {
    pub include_flags: u16,
    pub exclude_flags: u16,
    area_costs: [f32; AreaClass::COUNT],
}

impl QueryFilter {
    pub fn new(include_flags: u16, exclude_flags: u16, costs: &AreaCostConfig) -> Self {
        let mut area_costs = [1.0; AreaClass::COUNT];
        area_costs[AreaClass::Ground.index()] = costs.ground;
        area_costs[AreaClass::Water.index()] = costs.water;
        area_costs[AreaClass::Road.index()] = costs.road;
        area_costs[AreaClass::Door.index()] = costs.door;
        area_costs[AreaClass::Grass.index()] = costs.grass;
        area_costs[AreaClass::Jump.index()] = costs.jump;
        QueryFilter { include_flags, exclude_flags, area_costs }
    }

    /// Everything except disabled polygons.
    pub fn for_paths(costs: &AreaCostConfig) -> Self {
        Self::new(POLY_FLAGS_ALL ^ POLY_FLAG_DISABLED, POLY_FLAG_DISABLED, costs)
    }

    /// Walkable ground only: no water, nothing disabled.
    pub fn for_spawns(costs: &AreaCostConfig) -> Self {
        Self::new(
            POLY_FLAGS_ALL ^ (POLY_FLAG_DISABLED | POLY_FLAG_SWIM),
            POLY_FLAG_DISABLED | POLY_FLAG_SWIM,
            costs,
        )
    }

    pub fn passes(&self, poly: &NavPoly) -> bool {
        (poly.flags & self.include_flags) != 0 && (poly.flags & self.exclude_flags) == 0
    }

    pub fn area_cost(&self, area: AreaClass) -> f32 {
        self.area_costs[area.index()]
    }

    /// Cost of moving from `a` to `b` across `poly`.
    pub fn cost(&self, a: Vec3, b: Vec3, poly: &NavPoly) -> f32 {
        a.distance(b) * self.area_cost(poly.area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_polygons_are_linked() {
        let mesh = NavMesh::build(&NavMeshData::grid(Vec3::zero(), 10.0, 3, 2)).unwrap();
        assert_eq!(mesh.poly_count(), 6);
        let corner = mesh.poly(0).unwrap();
        let linked: Vec<PolyRef> = corner.neighbours.iter().flatten().copied().collect();
        assert_eq!(linked.len(), 2);
        assert!(linked.contains(&1));
        assert!(linked.contains(&3));
        let middle = mesh.poly(1).unwrap();
        assert_eq!(middle.neighbours.iter().flatten().count(), 3);
    }

    #[test]
    fn clockwise_input_is_normalized() {
        let data = NavMeshData {
            vertices: vec![[0.0, 0.0, 0.0], [0.0, 4.0, 0.0], [4.0, 4.0, 0.0], [4.0, 0.0, 0.0]],
            polygons: vec![NavPolyData { vertices: vec![0, 1, 2, 3], area: AreaClass::Ground, disabled: false }],
        };
        let mesh = NavMesh::build(&data).unwrap();
        let poly = mesh.poly(0).unwrap();
        assert!((poly.ground_area - 16.0).abs() < 1e-4);
        assert!(mesh.contains_xy(poly, Vec2::new(2.0, 2.0)));
        assert!(!mesh.contains_xy(poly, Vec2::new(5.0, 2.0)));
    }

    #[test]
    fn portal_orientation_follows_travel_direction() {
        let mesh = NavMesh::build(&NavMeshData::grid(Vec3::zero(), 10.0, 2, 1)).unwrap();
        let (left, right) = mesh.portal_points(0, 1).unwrap();
        // Heading +x, the left side is +y.
        assert_eq!(left, Vec3::new(10.0, 10.0, 0.0));
        assert_eq!(right, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn rejects_bad_data() {
        assert_eq!(NavMesh::build(&NavMeshData::default()).unwrap_err(), NavMeshError::Empty);
        let data = NavMeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            polygons: vec![NavPolyData { vertices: vec![0, 1, 7], area: AreaClass::Ground, disabled: false }],
        };
        assert!(matches!(NavMesh::build(&data), Err(NavMeshError::InvalidVertexIndex { poly: 0, index: 7 })));
        let degenerate = NavMeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            polygons: vec![NavPolyData { vertices: vec![0, 1, 2], area: AreaClass::Ground, disabled: false }],
        };
        assert_eq!(NavMesh::build(&degenerate).unwrap_err(), NavMeshError::DegeneratePolygon(0));
    }

    #[test]
    fn filters_respect_flags() {
        let mut data = NavMeshData::grid(Vec3::zero(), 1.0, 3, 1);
        data.polygons[1].area = AreaClass::Water;
        data.polygons[2].disabled = true;
        let mesh = NavMesh::build(&data).unwrap();
        let costs = AreaCostConfig::default();
        let paths = QueryFilter::for_paths(&costs);
        let spawns = QueryFilter::for_spawns(&costs);
        assert!(paths.passes(mesh.poly(1).unwrap()));
        assert!(!spawns.passes(mesh.poly(1).unwrap()));
        assert!(!paths.passes(mesh.poly(2).unwrap()));
        assert_eq!(paths.area_cost(AreaClass::Water), 15.0);
    }

    #[test]
    fn closest_point_clamps_to_boundary() {
        let mesh = NavMesh::build(&NavMeshData::grid(Vec3::new(0.0, 0.0, 2.0), 4.0, 1, 1)).unwrap();
        let poly = mesh.poly(0).unwrap();
        let inside = mesh.closest_point_on_poly(poly, Vec3::new(1.0, 1.0, 9.0));
        assert_eq!(inside, Vec3::new(1.0, 1.0, 2.0));
        let outside = mesh.closest_point_on_poly(poly, Vec3::new(6.0, 2.0, 0.0));
        assert!(outside.approx_eq(Vec3::new(4.0, 2.0, 2.0), 1e-5));
    }
}
