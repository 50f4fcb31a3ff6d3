// world_pathfinder/pathfinder/src/systems/pathfinding/coordinator.rs
use crate::concurrent::query_context::NavQueryContext;
use crate::core::config::PathfinderConfig;
use crate::core::error::{PathError, PathResult};
use crate::core::types::{Path, PathOutcome, WorldCoordinates};
use crate::operational::monitoring::metrics::{record_failure, record_outcome, record_query, record_search_fault};
use crate::systems::navmesh::QueryFilter;
use crate::world::zone::ZoneQuery;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Query classification by endpoint cell membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    WorldToWorld,
    CellToWorld,
    WorldToCell,
    /// Both endpoints in the same cell.
    SameCell,
    CellToCell,
}

impl Regime {
    pub fn classify(start: &WorldCoordinates, goal: &WorldCoordinates) -> Regime {
        match (&start.cell, &goal.cell) {
            (None, None) => Regime::WorldToWorld,
            (Some(_), None) => Regime::CellToWorld,
            (None, Some(_)) => Regime::WorldToCell,
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => Regime::SameCell,
            (Some(_), Some(_)) => Regime::CellToCell,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::WorldToWorld => "world_to_world",
            Regime::CellToWorld => "cell_to_world",
            Regime::WorldToCell => "world_to_cell",
            Regime::SameCell => "same_cell",
            Regime::CellToCell => "cell_to_cell",
        }
    }
}

/// Entry point for path and spawn queries. Stateless apart from configuration; all scratch
/// state lives in the caller's [`NavQueryContext`].
pub struct PathFinder {
    pub(crate) config: Arc<PathfinderConfig>,
    pub(crate) path_filter: QueryFilter,
    pub(crate) spawn_filter: QueryFilter,
}

impl PathFinder {
    pub fn new(config: Arc<PathfinderConfig>) -> Self {
        PathFinder {
            path_filter: QueryFilter::for_paths(&config.area_costs),
            spawn_filter: QueryFilter::for_spawns(&config.area_costs),
            config,
        }
    }

    pub fn config(&self) -> &PathfinderConfig {
        &self.config
    }

    pub fn new_context(&self) -> NavQueryContext {
        NavQueryContext::from_config(&self.config)
    }

    /// Route from `start` to `goal`. The first point is always `start`; complete and
    /// straight-line results end at `goal`.
    pub fn find_path(
        &self,
        ctx: &mut NavQueryContext,
        start: &WorldCoordinates,
        goal: &WorldCoordinates,
        zone: &dyn ZoneQuery,
    ) -> PathResult<Path> {
        let regime = Regime::classify(start, goal);
        observed(regime, || self.route(ctx, start, goal, zone, self.config.allow_partial))
    }

    /// Shortest route from `start` to any of `goals`.
    pub fn find_path_to_any(
        &self,
        ctx: &mut NavQueryContext,
        start: &WorldCoordinates,
        goals: &[WorldCoordinates],
        zone: &dyn ZoneQuery,
        allow_partial: bool,
    ) -> PathResult<Path> {
        let Some(first_goal) = goals.first() else {
            record_failure("invalid_input");
            return Err(PathError::InvalidInput("no candidate destinations".to_string()));
        };

        if start.is_world() && goals.iter().all(|g| g.is_world()) {
            return observed(Regime::WorldToWorld, || {
                validate(start)?;
                for goal in goals {
                    validate(goal)?;
                }
                self.outdoor_or_straight(ctx, start, goals, first_goal, zone, allow_partial)
            });
        }

        observed(Regime::classify(start, first_goal), || {
            validate(start)?;
            for goal in goals {
                validate(goal)?;
            }
            let mut best: Option<(f32, Path)> = None;
            let mut last_error = None;
            for goal in goals {
                match self.route(ctx, start, goal, zone, allow_partial) {
                    Ok(path) => {
                        let length = path.length();
                        if best.as_ref().map_or(true, |(best_len, _)| length < *best_len) {
                            best = Some((length, path));
                        }
                    }
                    Err(e) => last_error = Some(e),
                }
            }
            match (best, last_error) {
                (Some((_, path)), _) => Ok(path),
                (None, Some(e)) => Err(e),
                (None, None) => Err(PathError::SearchExhausted("no destination produced a route".to_string())),
            }
        })
    }

    pub(crate) fn route(
        &self,
        ctx: &mut NavQueryContext,
        start: &WorldCoordinates,
        goal: &WorldCoordinates,
        zone: &dyn ZoneQuery,
        allow_partial: bool,
    ) -> PathResult<Path> {
        validate(start)?;
        validate(goal)?;

        if start == goal {
            return Ok(Path::new(vec![start.clone(), goal.clone()], PathOutcome::Complete));
        }

        match (&start.cell, &goal.cell) {
            (None, None) => self.outdoor_or_straight(ctx, start, std::slice::from_ref(goal), goal, zone, allow_partial),
            (Some(cell), None) => contain_fault(ctx, "indoor search", |ctx| {
                self.find_cell_to_world(ctx, start, cell, goal, zone, allow_partial)
            }),
            (None, Some(cell)) => contain_fault(ctx, "indoor search", |_| self.find_world_to_cell(start, goal, cell)),
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => {
                contain_fault(ctx, "indoor search", |_| self.find_within_cell(start, goal, a))
            }
            (Some(a), Some(b)) => contain_fault(ctx, "indoor search", |_| self.find_cell_to_cell(start, a, goal, b)),
        }
    }

    /// Outdoor search with the straight-line fallback towards `fallback_goal`.
    fn outdoor_or_straight(
        &self,
        ctx: &mut NavQueryContext,
        start: &WorldCoordinates,
        goals: &[WorldCoordinates],
        fallback_goal: &WorldCoordinates,
        zone: &dyn ZoneQuery,
        allow_partial: bool,
    ) -> PathResult<Path> {
        match contain_fault(ctx, "outdoor search", |ctx| self.find_outdoor(ctx, start, goals, zone, allow_partial)) {
            Ok(path) if path.len() >= 2 => Ok(path),
            Ok(_) => Ok(Path::straight_line(start, fallback_goal)),
            Err(PathError::SearchExhausted(reason)) => {
                debug!("Falling back to a straight line: {}", reason);
                Ok(Path::straight_line(start, fallback_goal))
            }
            Err(e) => Err(e),
        }
    }
}

/// Runs a public query, recording its latency and outcome or failure kind.
fn observed(regime: Regime, query: impl FnOnce() -> PathResult<Path>) -> PathResult<Path> {
    let timer = Instant::now();
    let result = query();
    record_query(regime.as_str(), timer.elapsed().as_secs_f64());
    match &result {
        Ok(path) => record_outcome(path.outcome),
        Err(e) => {
            debug!("{} query failed: {}", regime.as_str(), e);
            record_failure(e.kind());
        }
    }
    result
}

fn validate(point: &WorldCoordinates) -> PathResult<()> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(PathError::InvalidInput(format!("non-finite coordinates {:?}", point.position)))
    }
}

/// Runs one search leg, converting a panic into `SearchExhausted` and clearing the context.
pub(crate) fn contain_fault<T>(
    ctx: &mut NavQueryContext,
    what: &str,
    leg: impl FnOnce(&mut NavQueryContext) -> PathResult<T>,
) -> PathResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(|| leg(ctx))) {
        Ok(result) => result,
        Err(_) => {
            error!("Unhandled pathing fault in {}", what);
            record_search_fault();
            ctx.reset();
            Err(PathError::SearchExhausted(format!("search fault in {}", what)))
        }
    }
}
