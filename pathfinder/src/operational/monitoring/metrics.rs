// world_pathfinder/pathfinder/src/operational/monitoring/metrics.rs
use crate::core::config::MetricsConfig;
use crate::core::types::PathOutcome;
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Instant;
use tracing::info;

pub struct PathfinderMetrics {
    start_time: Instant,
}

impl PathfinderMetrics {
    /// Describes all pathfinder metrics and, when enabled, serves them over HTTP for Prometheus.
    pub fn new(config: &MetricsConfig) -> Result<Self> {
        if config.prometheus_enabled {
            PrometheusBuilder::new()
                .with_http_listener(([0, 0, 0, 0], config.listen_port))
                .install()
                .context("Failed to install Prometheus exporter")?;
            info!("Prometheus exporter listening on port {}", config.listen_port);
        }

        describe_counter!("pathfinder_queries_total", "Path queries by regime");
        describe_counter!("pathfinder_query_failures_total", "Failed path queries by error kind");
        describe_counter!("pathfinder_paths_total", "Successful path queries by outcome");
        describe_counter!("pathfinder_search_faults_total", "Search legs aborted by an internal fault");
        describe_counter!("pathfinder_spawn_attempts_total", "Random points drawn while searching for spawn points");
        describe_counter!("pathfinder_navmesh_reloads_total", "Navigation mesh reloads");
        describe_histogram!("pathfinder_query_time_seconds", "Path query time in seconds");

        Ok(PathfinderMetrics { start_time: Instant::now() })
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

pub fn record_query(regime: &'static str, seconds: f64) {
    counter!("pathfinder_queries_total", "regime" => regime).increment(1);
    histogram!("pathfinder_query_time_seconds").record(seconds);
}

pub fn record_outcome(outcome: PathOutcome) {
    counter!("pathfinder_paths_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_failure(kind: &'static str) {
    counter!("pathfinder_query_failures_total", "kind" => kind).increment(1);
}

pub fn record_search_fault() {
    counter!("pathfinder_search_faults_total").increment(1);
}

pub fn record_spawn_attempts(attempts: u64) {
    counter!("pathfinder_spawn_attempts_total").increment(attempts);
}

// Logging setup
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "world_pathfinder_core=info,world_pathfinder=info,warn".into()),
        )
        .with(fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
