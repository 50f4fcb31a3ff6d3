// world_pathfinder/pathfinder/src/core/config.rs
use super::constants::*;
use super::error::WorldResult;
use super::geometry::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaCostConfig {
    pub ground: f32,
    pub water: f32,
    pub road: f32,
    pub door: f32,
    pub grass: f32,
    pub jump: f32,
}

impl Default for AreaCostConfig {
    fn default() -> Self {
        AreaCostConfig {
            ground: AREA_COST_GROUND,
            water: AREA_COST_WATER,
            road: AREA_COST_ROAD,
            door: AREA_COST_DOOR,
            grass: AREA_COST_GRASS,
            jump: AREA_COST_JUMP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// 0 means one thread per logical CPU.
    pub threads: usize,
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        WorkerPoolConfig {
            threads: 0,
            thread_name_prefix: POOL_THREAD_PREFIX.to_string(),
        }
    }
}

impl WorkerPoolConfig {
    pub fn resolved_threads(&self) -> usize {
        if self.threads == 0 { num_cpus::get().max(1) } else { self.threads }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub prometheus_enabled: bool,
    pub listen_port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            prometheus_enabled: false,
            listen_port: DEFAULT_METRICS_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfinderConfig {
    pub max_search_nodes: usize,
    pub max_poly_path: usize,
    pub max_straight_path: usize,
    pub max_candidate_regions: usize,
    pub spawn_attempts: usize,
    pub spawn_accept_radius_factor: f32,
    pub path_extents: Vec3,
    pub spawn_extents: Vec3,
    /// Accept paths that end at the closest reachable point when the goal is cut off.
    pub allow_partial: bool,
    /// Seed for per-worker random sources; unset draws from entropy.
    pub rng_seed: Option<u64>,
    pub area_costs: AreaCostConfig,
    pub worker_pool: WorkerPoolConfig,
    pub metrics: MetricsConfig,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        PathfinderConfig {
            max_search_nodes: MAX_SEARCH_NODES,
            max_poly_path: MAX_POLY_PATH,
            max_straight_path: MAX_STRAIGHT_PATH,
            max_candidate_regions: MAX_CANDIDATE_REGIONS,
            spawn_attempts: SPAWN_ATTEMPTS,
            spawn_accept_radius_factor: SPAWN_ACCEPT_RADIUS_FACTOR,
            path_extents: PATH_EXTENTS,
            spawn_extents: SPAWN_EXTENTS,
            allow_partial: true,
            rng_seed: None,
            area_costs: AreaCostConfig::default(),
            worker_pool: WorkerPoolConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl PathfinderConfig {
    pub fn from_yaml_str(yaml: &str) -> WorldResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> WorldResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}
