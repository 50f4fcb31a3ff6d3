// world_pathfinder/pathfinder/src/world/zone.rs
use super::building::{Building, BuildingTemplate};
use super::region::NavMeshRegion;
use crate::concurrent::region_index::RegionIndex;
use dashmap::DashMap;
use std::sync::Arc;

/// Spatial queries the pathfinder needs from the world container.
pub trait ZoneQuery: Send + Sync {
    /// Outdoor regions overlapping the circle (`x`, `y`, `radius`) on the ground plane.
    fn regions_overlapping(&self, x: f32, y: f32, radius: f32) -> Vec<Arc<NavMeshRegion>>;

    fn terrain_height(&self, x: f32, y: f32) -> f32;
}

pub trait TerrainHeight: Send + Sync {
    fn height_at(&self, x: f32, y: f32) -> f32;
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatTerrain {
    pub height: f32,
}

impl TerrainHeight for FlatTerrain {
    fn height_at(&self, _x: f32, _y: f32) -> f32 {
        self.height
    }
}

/// In-process world container: regions, templates and placed buildings.
pub struct Zone {
    name: String,
    regions: RegionIndex,
    terrain: Box<dyn TerrainHeight>,
    templates: DashMap<String, Arc<BuildingTemplate>>,
    buildings: DashMap<u64, Arc<Building>>,
}

impl Zone {
    pub fn new(name: impl Into<String>, terrain: Box<dyn TerrainHeight>) -> Self {
        Zone {
            name: name.into(),
            regions: RegionIndex::new(),
            terrain,
            templates: DashMap::new(),
            buildings: DashMap::new(),
        }
    }

    pub fn flat(name: impl Into<String>, height: f32) -> Self {
        Self::new(name, Box::new(FlatTerrain { height }))
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn region_index(&self) -> &RegionIndex { &self.regions }

    pub fn add_region(&self, region: Arc<NavMeshRegion>) {
        self.regions.insert(region);
    }

    pub fn remove_region(&self, id: u32) -> bool {
        self.regions.remove(id)
    }

    pub fn region(&self, id: u32) -> Option<Arc<NavMeshRegion>> {
        self.regions.get(id)
    }

    pub fn region_count(&self) -> usize {
        self.regions.size()
    }

    pub fn add_template(&self, template: Arc<BuildingTemplate>) {
        self.templates.insert(template.name().to_string(), template);
    }

    pub fn template(&self, name: &str) -> Option<Arc<BuildingTemplate>> {
        self.templates.get(name).map(|t| t.value().clone())
    }

    pub fn add_building(&self, building: Arc<Building>) {
        self.buildings.insert(building.id(), building);
    }

    pub fn building(&self, id: u64) -> Option<Arc<Building>> {
        self.buildings.get(&id).map(|b| b.value().clone())
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}

impl ZoneQuery for Zone {
    fn regions_overlapping(&self, x: f32, y: f32, radius: f32) -> Vec<Arc<NavMeshRegion>> {
        self.regions.query_radius(x, y, radius)
    }

    fn terrain_height(&self, x: f32, y: f32) -> f32 {
        self.terrain.height_at(x, y)
    }
}
