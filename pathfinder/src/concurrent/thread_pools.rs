// world_pathfinder/pathfinder/src/concurrent/thread_pools.rs
use super::query_context::with_thread_context;
use crate::core::config::WorkerPoolConfig;
use crate::core::error::PathResult;
use crate::core::geometry::{Sphere, Vec3};
use crate::core::types::{Path, WorldCoordinates};
use crate::systems::pathfinding::PathFinder;
use crate::world::zone::ZoneQuery;
use anyhow::Context;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct PathRequest {
    pub start: WorldCoordinates,
    pub goal: WorldCoordinates,
}

impl PathRequest {
    pub fn new(start: WorldCoordinates, goal: WorldCoordinates) -> Self {
        PathRequest { start, goal }
    }
}

/// Dedicated worker pool for batches of path and spawn queries. Every worker thread keeps its
/// own query context.
pub struct PathfindingPool {
    pool: Arc<ThreadPool>,
    finder: Arc<PathFinder>,
}

impl PathfindingPool {
    pub fn new(finder: Arc<PathFinder>) -> Result<Self, anyhow::Error> {
        let pool_config = finder.config().worker_pool.clone();
        let pool = Self::create_pool(&pool_config)?;
        Ok(PathfindingPool { pool: Arc::new(pool), finder })
    }

    fn create_pool(config: &WorkerPoolConfig) -> Result<ThreadPool, anyhow::Error> {
        let threads = config.resolved_threads();
        let prefix = config.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .with_context(|| format!("Failed to build {} pool", config.thread_name_prefix))?;
        info!("Pathfinding pool '{}' started with {} threads", config.thread_name_prefix, threads);
        Ok(pool)
    }

    pub fn finder(&self) -> &Arc<PathFinder> {
        &self.finder
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs every request in parallel; results keep the request order.
    pub fn find_paths(&self, requests: &[PathRequest], zone: &dyn ZoneQuery) -> Vec<PathResult<Path>> {
        let finder = &self.finder;
        debug!("Dispatching {} path requests", requests.len());
        self.pool.install(|| {
            requests
                .par_iter()
                .map(|request| {
                    with_thread_context(finder.config(), |ctx| {
                        finder.find_path(ctx, &request.start, &request.goal, zone)
                    })
                })
                .collect()
        })
    }

    pub fn spawn_points(&self, areas: &[Sphere], zone: &dyn ZoneQuery) -> Vec<PathResult<Vec3>> {
        let finder = &self.finder;
        self.pool.install(|| {
            areas
                .par_iter()
                .map(|area| with_thread_context(finder.config(), |ctx| finder.spawn_point_in_area(ctx, area, zone)))
                .collect()
        })
    }
}
