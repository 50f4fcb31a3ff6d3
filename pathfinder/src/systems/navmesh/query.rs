// world_pathfinder/pathfinder/src/systems/navmesh/query.rs
use super::mesh::{NavMesh, NavPoly, PolyRef, QueryFilter};
use crate::core::constants::HEURISTIC_SCALE;
use crate::core::error::{PathError, PathResult};
use crate::core::geometry::{Segment, Vec2, Vec3};
use crate::systems::pathfinding::funnel::{string_pull, GroundPlane, Portal};
use ahash::AHashMap;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::trace;

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    poly: PolyRef,
    parent: Option<usize>,
    pos: Vec3,
    cost: f32,
    total: f32,
    closed: bool,
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    total: f32,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.total.total_cmp(&other.total) == Ordering::Equal && self.node == other.node
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    // Reversed so the heap pops the cheapest entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other.total.total_cmp(&self.total).then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Polygon corridor returned by [`NavMeshQuery::find_path`].
#[derive(Clone, Debug, PartialEq)]
pub struct PolyPath {
    pub polys: Vec<PolyRef>,
    /// The end polygon was not reached; the corridor stops at the closest explored polygon.
    pub partial: bool,
    pub out_of_nodes: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StraightPath {
    pub points: Vec<Vec3>,
    pub truncated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RaycastHit {
    /// Fraction of the segment travelled before hitting a wall, `f32::MAX` when unobstructed.
    pub t: f32,
    pub visited: Vec<PolyRef>,
}

impl RaycastHit {
    pub fn reached(&self) -> bool {
        self.t == f32::MAX
    }
}

/// Scratch state for searches over a `NavMesh`. One instance per worker; never shared.
pub struct NavMeshQuery {
    max_nodes: usize,
    nodes: Vec<SearchNode>,
    lookup: AHashMap<PolyRef, usize>,
    open: BinaryHeap<OpenEntry>,
}

impl NavMeshQuery {
    pub fn new(max_nodes: usize) -> Self {
        let max_nodes = max_nodes.max(1);
        NavMeshQuery {
            max_nodes,
            nodes: Vec::with_capacity(max_nodes),
            lookup: AHashMap::with_capacity(max_nodes),
            open: BinaryHeap::with_capacity(max_nodes),
        }
    }

    pub fn max_nodes(&self) -> usize { self.max_nodes }

    /// Number of nodes touched by the last search.
    pub fn nodes_in_use(&self) -> usize { self.nodes.len() }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.lookup.clear();
        self.open.clear();
    }

    fn node_for(&mut self, poly: PolyRef) -> Option<usize> {
        if let Some(&idx) = self.lookup.get(&poly) {
            return Some(idx);
        }
        if self.nodes.len() >= self.max_nodes {
            return None;
        }
        let idx = self.nodes.len();
        self.nodes.push(SearchNode {
            poly,
            parent: None,
            pos: Vec3::zero(),
            cost: 0.0,
            total: f32::INFINITY,
            closed: false,
        });
        self.lookup.insert(poly, idx);
        Some(idx)
    }

    /// Nearest polygon passing `filter` inside the box `center +- extents`, with the closest
    /// point on it.
    pub fn find_nearest_poly(
        &self,
        mesh: &NavMesh,
        center: Vec3,
        extents: Vec3,
        filter: &QueryFilter,
    ) -> Option<(PolyRef, Vec3)> {
        let mut best: Option<(PolyRef, Vec3, f32)> = None;
        for poly_ref in mesh.polys_in_box(center, extents) {
            let Some(poly) = mesh.poly(poly_ref) else { continue };
            if !filter.passes(poly) {
                continue;
            }
            let closest = mesh.closest_point_on_poly(poly, center);
            let d = closest.distance_squared(center);
            if best.map_or(true, |(_, _, best_d)| d < best_d) {
                best = Some((poly_ref, closest, d));
            }
        }
        best.map(|(r, p, _)| (r, p))
    }

    /// Cost-weighted A* over polygon adjacency.
    ///
    /// When `end_ref` cannot be reached (disconnected, or the node pool ran out) the corridor to
    /// the explored polygon closest to `end_pos` is returned with `partial` set.
    pub fn find_path(
        &mut self,
        mesh: &NavMesh,
        start_ref: PolyRef,
        end_ref: PolyRef,
        start_pos: Vec3,
        end_pos: Vec3,
        filter: &QueryFilter,
        max_path: usize,
    ) -> PathResult<PolyPath> {
        if mesh.poly(start_ref).is_none() || mesh.poly(end_ref).is_none() {
            return Err(PathError::InvalidInput(format!(
                "polygon reference out of range ({} / {})",
                start_ref, end_ref
            )));
        }
        if !start_pos.is_finite() || !end_pos.is_finite() {
            return Err(PathError::InvalidInput("non-finite search endpoint".to_string()));
        }

        self.reset();
        if start_ref == end_ref {
            return Ok(PolyPath { polys: vec![start_ref], partial: false, out_of_nodes: false });
        }

        let start_idx = self.node_for(start_ref).ok_or_else(|| {
            PathError::SearchExhausted("node pool has no room for the start polygon".to_string())
        })?;
        let start_h = start_pos.distance(end_pos) * HEURISTIC_SCALE;
        self.nodes[start_idx] = SearchNode {
            poly: start_ref,
            parent: None,
            pos: start_pos,
            cost: 0.0,
            total: start_h,
            closed: false,
        };
        self.open.push(OpenEntry { total: start_h, node: start_idx });

        let mut best_node = start_idx;
        let mut best_h = start_h;
        let mut found = false;
        let mut out_of_nodes = false;

        while let Some(entry) = self.open.pop() {
            let current = self.nodes[entry.node];
            if current.closed || entry.total > current.total {
                continue;
            }
            self.nodes[entry.node].closed = true;

            if current.poly == end_ref {
                best_node = entry.node;
                found = true;
                break;
            }

            let Some(poly) = mesh.poly(current.poly) else { continue };
            let parent_poly = current.parent.map(|p| self.nodes[p].poly);

            for neighbour in poly.neighbours.iter().flatten().copied() {
                if Some(neighbour) == parent_poly {
                    continue;
                }
                let Some(neighbour_poly) = mesh.poly(neighbour) else { continue };
                if !filter.passes(neighbour_poly) {
                    continue;
                }
                let Some((left, right)) = mesh.portal_points(current.poly, neighbour) else { continue };

                let Some(idx) = self.node_for(neighbour) else {
                    out_of_nodes = true;
                    continue;
                };
                let is_new = self.nodes[idx].total.is_infinite();
                let pos = if is_new { left.lerp(right, 0.5) } else { self.nodes[idx].pos };

                let (cost, heuristic) = if neighbour == end_ref {
                    let cur_cost = filter.cost(current.pos, pos, poly);
                    let end_cost = filter.cost(pos, end_pos, neighbour_poly);
                    (current.cost + cur_cost + end_cost, 0.0)
                } else {
                    (
                        current.cost + filter.cost(current.pos, pos, poly),
                        pos.distance(end_pos) * HEURISTIC_SCALE,
                    )
                };
                let total = cost + heuristic;

                if !is_new && total >= self.nodes[idx].total {
                    continue;
                }
                self.nodes[idx] = SearchNode {
                    poly: neighbour,
                    parent: Some(entry.node),
                    pos,
                    cost,
                    total,
                    closed: false,
                };
                self.open.push(OpenEntry { total, node: idx });

                if heuristic < best_h {
                    best_h = heuristic;
                    best_node = idx;
                }
            }
        }

        let mut polys = Vec::new();
        let mut cursor = Some(best_node);
        while let Some(idx) = cursor {
            polys.push(self.nodes[idx].poly);
            cursor = self.nodes[idx].parent;
        }
        polys.reverse();

        let mut partial = !found;
        if polys.len() > max_path {
            polys.truncate(max_path);
            partial = true;
        }
        trace!(
            "Polygon search {} -> {}: {} polys, partial={}, nodes={}",
            start_ref, end_ref, polys.len(), partial, self.nodes.len()
        );
        Ok(PolyPath { polys, partial, out_of_nodes })
    }

    /// Strings a polygon corridor into waypoints. Endpoints are clamped onto the first and last
    /// polygons of the corridor.
    pub fn find_straight_path(
        &self,
        mesh: &NavMesh,
        start_pos: Vec3,
        end_pos: Vec3,
        corridor: &[PolyRef],
        max_points: usize,
    ) -> PathResult<StraightPath> {
        let (Some(&first), Some(&last)) = (corridor.first(), corridor.last()) else {
            return Err(PathError::InvalidInput("empty polygon corridor".to_string()));
        };
        let first_poly = mesh.poly(first).ok_or_else(|| PathError::InvalidInput(format!("bad polygon {}", first)))?;
        let last_poly = mesh.poly(last).ok_or_else(|| PathError::InvalidInput(format!("bad polygon {}", last)))?;
        let start = mesh.closest_point_on_poly(first_poly, start_pos);
        let end = mesh.closest_point_on_poly(last_poly, end_pos);

        let mut portals = Vec::with_capacity(corridor.len().saturating_sub(1));
        for pair in corridor.windows(2) {
            let (left, right) = mesh.portal_points(pair[0], pair[1]).ok_or_else(|| {
                PathError::InvalidInput(format!("polygons {} and {} are not adjacent", pair[0], pair[1]))
            })?;
            portals.push(Portal { left, right });
        }

        let mut points = string_pull(start, &portals, end, GroundPlane::Xy);
        let truncated = points.len() > max_points;
        points.truncate(max_points.max(1));
        Ok(StraightPath { points, truncated })
    }

    /// Uniformly random point on polygons connected to `start_ref` whose linking edges come within
    /// `radius` of `center` on the ground plane. Polygons are weighted by area.
    pub fn find_random_point_around_circle<R: Rng + ?Sized>(
        &mut self,
        mesh: &NavMesh,
        start_ref: PolyRef,
        center: Vec3,
        radius: f32,
        filter: &QueryFilter,
        rng: &mut R,
    ) -> Option<(PolyRef, Vec3)> {
        let start_poly = mesh.poly(start_ref)?;
        if !filter.passes(start_poly) || !center.is_finite() || !(radius > 0.0) {
            return None;
        }
        self.reset();
        let radius_sq = radius * radius;

        let start_idx = self.node_for(start_ref)?;
        self.nodes[start_idx].pos = center;
        self.nodes[start_idx].total = 0.0;
        self.open.push(OpenEntry { total: 0.0, node: start_idx });

        let mut chosen: Option<PolyRef> = None;
        let mut area_sum = 0.0f32;

        while let Some(entry) = self.open.pop() {
            let current = self.nodes[entry.node];
            if current.closed {
                continue;
            }
            self.nodes[entry.node].closed = true;
            let Some(poly) = mesh.poly(current.poly) else { continue };

            area_sum += poly.ground_area;
            if rng.gen::<f32>() * area_sum <= poly.ground_area {
                chosen = Some(current.poly);
            }

            for neighbour in poly.neighbours.iter().flatten().copied() {
                let Some(neighbour_poly) = mesh.poly(neighbour) else { continue };
                if !filter.passes(neighbour_poly) {
                    continue;
                }
                let Some((left, right)) = mesh.portal_points(current.poly, neighbour) else { continue };
                if Segment::new(left, right).distance_squared_xy(center.xy()) > radius_sq {
                    continue;
                }
                let Some(idx) = self.node_for(neighbour) else { continue };
                if !self.nodes[idx].total.is_infinite() {
                    continue;
                }
                let pos = left.lerp(right, 0.5);
                let cost = current.total + current.pos.distance(pos);
                self.nodes[idx].pos = pos;
                self.nodes[idx].total = cost;
                self.nodes[idx].parent = Some(entry.node);
                self.open.push(OpenEntry { total: cost, node: idx });
            }
        }

        let poly_ref = chosen?;
        let poly = mesh.poly(poly_ref)?;
        Some((poly_ref, random_point_in_poly(mesh, poly, rng)))
    }

    /// Walks the polygons along the ground-plane segment `start_pos -> end_pos`.
    pub fn raycast(
        &self,
        mesh: &NavMesh,
        start_ref: PolyRef,
        start_pos: Vec3,
        end_pos: Vec3,
        filter: &QueryFilter,
    ) -> Option<RaycastHit> {
        mesh.poly(start_ref)?;
        let p0 = start_pos.xy();
        let p1 = end_pos.xy();
        let mut hit = RaycastHit { t: f32::MAX, visited: Vec::new() };
        let mut current = start_ref;

        for _ in 0..self.max_nodes {
            hit.visited.push(current);
            let poly = mesh.poly(current)?;
            let points = mesh.poly_vertices(poly);
            let Some((_, tmax, exit_edge)) = intersect_segment_poly_xy(p0, p1, &points) else {
                hit.t = 0.0;
                return Some(hit);
            };
            let Some(exit_edge) = exit_edge else {
                return Some(hit);
            };
            if tmax >= 1.0 {
                return Some(hit);
            }
            let next = poly.neighbours[exit_edge]
                .filter(|n| mesh.poly(*n).map_or(false, |p| filter.passes(p)));
            match next {
                Some(n) => current = n,
                None => {
                    hit.t = tmax.max(0.0);
                    return Some(hit);
                }
            }
        }
        hit.t = 0.0;
        Some(hit)
    }
}

/// Clip the segment `p0 -> p1` against a counter-clockwise convex polygon.
/// Returns `(tmin, tmax, exit_edge)`; `exit_edge` is `None` when the segment ends inside.
fn intersect_segment_poly_xy(p0: Vec2, p1: Vec2, points: &[Vec3]) -> Option<(f32, f32, Option<usize>)> {
    const EPS: f32 = 1e-6;
    let d = p1 - p0;
    let n = points.len();
    let mut tmin = 0.0f32;
    let mut tmax = 1.0f32;
    let mut exit_edge = None;

    for i in 0..n {
        let a = points[i].xy();
        let b = points[(i + 1) % n].xy();
        let e = b - a;
        let num = e.cross(p0 - a);
        let den = e.cross(d);
        if den.abs() < EPS {
            if num < -EPS {
                return None;
            }
            continue;
        }
        let t = -num / den;
        if den > 0.0 {
            if t > tmin {
                tmin = t;
            }
        } else if t < tmax {
            tmax = t;
            exit_edge = Some(i);
        }
        if tmin > tmax + EPS {
            return None;
        }
    }
    Some((tmin, tmax, exit_edge))
}

fn random_point_in_poly<R: Rng + ?Sized>(mesh: &NavMesh, poly: &NavPoly, rng: &mut R) -> Vec3 {
    let points = mesh.poly_vertices(poly);
    let v0 = points[0];
    let areas: Vec<f32> = (1..points.len() - 1)
        .map(|i| ((points[i].xy() - v0.xy()).cross(points[i + 1].xy() - v0.xy()) * 0.5).abs())
        .collect();
    let total: f32 = areas.iter().sum();

    let threshold = rng.gen::<f32>() * total;
    let mut acc = 0.0;
    let mut tri = areas.len() - 1;
    for (i, area) in areas.iter().enumerate() {
        acc += area;
        if threshold <= acc {
            tri = i;
            break;
        }
    }

    let (v1, v2) = (points[tri + 1], points[tri + 2]);
    let u = rng.gen::<f32>().sqrt();
    let v = rng.gen::<f32>();
    let a = 1.0 - u;
    let b = (1.0 - v) * u;
    let c = v * u;
    v0 * a + v1 * b + v2 * c
}
