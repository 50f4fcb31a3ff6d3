// world_pathfinder/pathfinder/src/main.rs
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use world_pathfinder_core::concurrent::thread_pools::{PathRequest, PathfindingPool};
use world_pathfinder_core::core::config::PathfinderConfig;
use world_pathfinder_core::operational::monitoring::metrics::{init_logging, PathfinderMetrics};
use world_pathfinder_core::systems::pathfinding::PathFinder;
use world_pathfinder_core::world::loader::{resolve_point, WorldDescription};

fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!("Location: {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {:?}", e);
        return Err(e);
    }

    let mut args = std::env::args().skip(1);
    let world_path = args
        .next()
        .context("usage: world_pathfinder <world.yaml|world.json> [config.yaml]")?;
    let config = match args.next() {
        Some(path) => PathfinderConfig::load(&path).with_context(|| format!("Failed to load config {}", path))?,
        None => PathfinderConfig::default(),
    };
    let config = Arc::new(config);

    let metrics = PathfinderMetrics::new(&config.metrics)?;

    let description =
        WorldDescription::load(&world_path).with_context(|| format!("Failed to load world {}", world_path))?;
    let zone = description.build_zone().context("Failed to build zone")?;

    let finder = Arc::new(PathFinder::new(config.clone()));
    let pool = PathfindingPool::new(finder)?;

    let mut requests = Vec::with_capacity(description.queries.len());
    for (i, query) in description.queries.iter().enumerate() {
        match (resolve_point(&zone, &query.start), resolve_point(&zone, &query.goal)) {
            (Ok(start), Ok(goal)) => requests.push(PathRequest::new(start, goal)),
            (Err(e), _) | (_, Err(e)) => warn!("Query {} skipped: {}", i, e),
        }
    }
    info!("Running {} path queries on {} threads", requests.len(), pool.threads());

    let started = Instant::now();
    let results = pool.find_paths(&requests, &zone);
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(path) => info!(
                "Query {}: {} waypoints, {:.2} m, {}",
                i,
                path.len(),
                path.length(),
                path.outcome.as_str()
            ),
            Err(e) => error!("Query {} failed ({}): {}", i, e.kind(), e),
        }
    }
    info!(
        "Finished {} queries in {:.3} ms (uptime {:.3} s)",
        results.len(),
        started.elapsed().as_secs_f64() * 1000.0,
        metrics.uptime_seconds()
    );
    Ok(())
}
