// world_pathfinder/pathfinder/src/world/region.rs
use crate::core::constants::REGION_BOUNDS_RADIUS_FACTOR;
use crate::core::error::NavMeshError;
use crate::core::geometry::{Aabb, Sphere, Vec2};
use crate::systems::navmesh::{NavMesh, NavMeshData};
use metrics::counter;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Shared, reloadable navigation mesh. Searches hold the read guard for their duration;
/// reloads take the write guard.
#[derive(Debug, Default)]
pub struct NavMeshHandle {
    mesh: RwLock<Option<NavMesh>>,
    generation: AtomicU64,
}

impl NavMeshHandle {
    pub fn new(mesh: Option<NavMesh>) -> Self {
        NavMeshHandle { mesh: RwLock::new(mesh), generation: AtomicU64::new(0) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Option<NavMesh>> {
        self.mesh.read()
    }

    pub fn is_loaded(&self) -> bool {
        self.mesh.read().is_some()
    }

    /// Incremented by every reload or unload.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn reload(&self, mesh: NavMesh) -> u64 {
        let mut guard = self.mesh.write();
        *guard = Some(mesh);
        counter!("pathfinder_navmesh_reloads_total").increment(1);
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn unload(&self) -> u64 {
        let mut guard = self.mesh.write();
        *guard = None;
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Outdoor area covered by one navigation mesh.
#[derive(Debug)]
pub struct NavMeshRegion {
    id: u32,
    name: String,
    bounds: Aabb,
    bounding_sphere: Sphere,
    navmesh: NavMeshHandle,
}

impl NavMeshRegion {
    pub fn new(id: u32, name: impl Into<String>, mesh: NavMesh) -> Self {
        let bounds = mesh.bounds();
        let bounding_sphere = Sphere::new(bounds.center(), bounds.longest_half_extent() * REGION_BOUNDS_RADIUS_FACTOR);
        NavMeshRegion {
            id,
            name: name.into(),
            bounds,
            bounding_sphere,
            navmesh: NavMeshHandle::new(Some(mesh)),
        }
    }

    pub fn from_data(id: u32, name: impl Into<String>, data: &NavMeshData) -> Result<Self, NavMeshError> {
        let name = name.into();
        let mesh = NavMesh::build(data)?;
        info!("Region {} '{}' loaded with {} polygons", id, name, mesh.poly_count());
        Ok(Self::new(id, name, mesh))
    }

    pub fn id(&self) -> u32 { self.id }
    pub fn name(&self) -> &str { &self.name }

    /// Bounds of the mesh at creation; unchanged by reloads.
    pub fn bounds(&self) -> Aabb { self.bounds }

    /// Ground-plane sphere used for segment crossings, slightly inside the mesh bounds.
    pub fn bounding_sphere(&self) -> Sphere { self.bounding_sphere }

    pub fn navmesh(&self) -> &NavMeshHandle { &self.navmesh }

    pub fn contains_xy(&self, p: Vec2) -> bool {
        self.bounds.contains_xy(p)
    }
}
