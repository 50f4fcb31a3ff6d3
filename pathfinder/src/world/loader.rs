// world_pathfinder/pathfinder/src/world/loader.rs
use super::building::{Building, BuildingTemplate};
use super::region::NavMeshRegion;
use super::zone::Zone;
use crate::core::error::{WorldDataError, WorldResult};
use crate::core::geometry::{Transform, Vec3};
use crate::core::types::WorldCoordinates;
use crate::systems::indoor::{FloorMeshData, PortalLayout};
use crate::systems::navmesh::NavMeshData;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TerrainDescription {
    #[serde(default)]
    pub height: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RegionDescription {
    pub id: u32,
    pub name: String,
    pub navmesh: NavMeshData,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TemplateDescription {
    pub name: String,
    /// Empty for templates without an interior layout.
    #[serde(default)]
    pub floors: Vec<FloorMeshData>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BuildingDescription {
    pub id: u64,
    pub template: String,
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
}

/// A world position, or a model-space position inside `cell` of `building`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PointDescription {
    pub position: [f32; 3],
    #[serde(default)]
    pub building: Option<u64>,
    #[serde(default)]
    pub cell: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QueryDescription {
    pub start: PointDescription,
    pub goal: PointDescription,
}

fn default_zone_name() -> String {
    "zone".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WorldDescription {
    #[serde(default = "default_zone_name")]
    pub name: String,
    #[serde(default)]
    pub terrain: TerrainDescription,
    #[serde(default)]
    pub regions: Vec<RegionDescription>,
    #[serde(default)]
    pub templates: Vec<TemplateDescription>,
    #[serde(default)]
    pub buildings: Vec<BuildingDescription>,
    #[serde(default)]
    pub queries: Vec<QueryDescription>,
}

impl WorldDescription {
    pub fn from_yaml_str(yaml: &str) -> WorldResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> WorldResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a `.json` file as JSON and anything else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> WorldResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    /// Validates the description and builds a populated zone.
    pub fn build_zone(&self) -> WorldResult<Zone> {
        let zone = Zone::flat(self.name.clone(), self.terrain.height);

        let mut region_ids = AHashSet::new();
        for desc in &self.regions {
            if !region_ids.insert(desc.id) {
                return Err(WorldDataError::InvalidData(format!("duplicate region id {}", desc.id)));
            }
            let region = NavMeshRegion::from_data(desc.id, desc.name.clone(), &desc.navmesh)
                .map_err(|source| WorldDataError::NavMesh { region: desc.name.clone(), source })?;
            zone.add_region(Arc::new(region));
        }

        for desc in &self.templates {
            if zone.template(&desc.name).is_some() {
                return Err(WorldDataError::InvalidData(format!("duplicate template '{}'", desc.name)));
            }
            let layout = if desc.floors.is_empty() {
                None
            } else {
                let layout = PortalLayout::build(desc.name.clone(), &desc.floors)
                    .map_err(|source| WorldDataError::Layout { template: desc.name.clone(), source })?;
                Some(Arc::new(layout))
            };
            zone.add_template(Arc::new(BuildingTemplate::new(desc.name.clone(), layout)));
        }

        for desc in &self.buildings {
            if zone.building(desc.id).is_some() {
                return Err(WorldDataError::InvalidData(format!("duplicate building id {}", desc.id)));
            }
            let template = zone.template(&desc.template).ok_or_else(|| {
                WorldDataError::InvalidData(format!("building {} uses unknown template '{}'", desc.id, desc.template))
            })?;
            let transform = Transform::new(Vec3::from(desc.position), desc.yaw);
            zone.add_building(Building::new(desc.id, template, transform));
        }

        info!(
            "Zone '{}' loaded: {} regions, {} buildings",
            zone.name(),
            zone.region_count(),
            zone.building_count()
        );
        Ok(zone)
    }
}

/// Turns a point description into coordinates against a loaded zone.
pub fn resolve_point(zone: &Zone, point: &PointDescription) -> WorldResult<WorldCoordinates> {
    let position = Vec3::from(point.position);
    match (point.building, point.cell) {
        (None, None) => Ok(WorldCoordinates::world(position)),
        (Some(building_id), Some(cell_number)) => {
            let building = zone
                .building(building_id)
                .ok_or_else(|| WorldDataError::InvalidData(format!("unknown building {}", building_id)))?;
            let cell = building.cell_by_number(cell_number).ok_or_else(|| {
                WorldDataError::InvalidData(format!("building {} has no cell {}", building_id, cell_number))
            })?;
            Ok(WorldCoordinates::in_cell(position, cell))
        }
        _ => Err(WorldDataError::InvalidData(
            "indoor points need both a building and a cell".to_string(),
        )),
    }
}
