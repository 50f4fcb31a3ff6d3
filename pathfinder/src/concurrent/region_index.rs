// world_pathfinder/pathfinder/src/concurrent/region_index.rs
use crate::world::region::NavMeshRegion;
use parking_lot::RwLock;
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
struct SpatialRegion {
    region: Arc<NavMeshRegion>,
}

impl RTreeObject for SpatialRegion {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let b = self.region.bounds();
        AABB::from_corners([b.min.x, b.min.y], [b.max.x, b.max.y])
    }
}

/// Ground-plane index over outdoor navmesh regions.
pub struct RegionIndex {
    rtree: Arc<RwLock<RTree<SpatialRegion>>>,
}

impl Default for RegionIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionIndex {
    pub fn new() -> Self {
        RegionIndex {
            rtree: Arc::new(RwLock::new(RTree::new())),
        }
    }

    /// Build or rebuild the index from a collection of regions
    pub fn rebuild(&self, regions: &[Arc<NavMeshRegion>]) {
        let entries: Vec<SpatialRegion> = regions
            .iter()
            .map(|r| SpatialRegion { region: r.clone() })
            .collect();
        let new_tree = RTree::bulk_load(entries);

        let mut tree_guard = self.rtree.write();
        *tree_guard = new_tree;
        debug!("Region index rebuilt with {} regions", tree_guard.size());
    }

    pub fn insert(&self, region: Arc<NavMeshRegion>) {
        self.rtree.write().insert(SpatialRegion { region });
    }

    /// Removes the region with `id`; returns whether one was present.
    pub fn remove(&self, id: u32) -> bool {
        let mut tree_guard = self.rtree.write();
        let remaining: Vec<SpatialRegion> = tree_guard.iter().filter(|e| e.region.id() != id).cloned().collect();
        let removed = remaining.len() != tree_guard.size();
        if removed {
            *tree_guard = RTree::bulk_load(remaining);
        }
        removed
    }

    pub fn get(&self, id: u32) -> Option<Arc<NavMeshRegion>> {
        self.rtree.read().iter().find(|e| e.region.id() == id).map(|e| e.region.clone())
    }

    /// Regions whose bounds intersect the given rectangle, ordered by id
    pub fn query_aabb(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<Arc<NavMeshRegion>> {
        let query = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut found: Vec<Arc<NavMeshRegion>> = self
            .rtree
            .read()
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.region.clone())
            .collect();
        found.sort_by_key(|r| r.id());
        found
    }

    /// Regions whose bounds come within `radius` of (`x`, `y`)
    pub fn query_radius(&self, x: f32, y: f32, radius: f32) -> Vec<Arc<NavMeshRegion>> {
        let radius = radius.max(0.0);
        let r_sq = radius * radius;
        self.query_aabb(x - radius, y - radius, x + radius, y + radius)
            .into_iter()
            .filter(|region| {
                let b = region.bounds();
                let dx = (b.min.x - x).max(0.0).max(x - b.max.x);
                let dy = (b.min.y - y).max(0.0).max(y - b.max.y);
                dx * dx + dy * dy <= r_sq
            })
            .collect()
    }

    pub fn size(&self) -> usize {
        self.rtree.read().size()
    }

    pub fn clear(&self) {
        let mut tree_guard = self.rtree.write();
        *tree_guard = RTree::new();
    }
}
