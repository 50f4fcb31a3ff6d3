// world_pathfinder/pathfinder/src/concurrent/query_context.rs
use crate::core::config::PathfinderConfig;
use crate::systems::navmesh::NavMeshQuery;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;

/// Per-worker scratch for path and spawn queries.
pub struct NavQueryContext {
    pub query: NavMeshQuery,
    pub rng: StdRng,
}

impl NavQueryContext {
    pub fn new(max_nodes: usize, seed: Option<u64>) -> Self {
        NavQueryContext {
            query: NavMeshQuery::new(max_nodes),
            rng: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        }
    }

    pub fn from_config(config: &PathfinderConfig) -> Self {
        Self::new(config.max_search_nodes, config.rng_seed)
    }

    /// Drops any search state left behind by an interrupted query.
    pub fn reset(&mut self) {
        self.query.reset();
    }
}

thread_local! {
    static THREAD_CONTEXT: RefCell<Option<NavQueryContext>> = const { RefCell::new(None) };
}

/// Runs `f` with this thread's context, creating it on first use. Must not be nested.
pub fn with_thread_context<R>(config: &PathfinderConfig, f: impl FnOnce(&mut NavQueryContext) -> R) -> R {
    THREAD_CONTEXT.with(|slot| {
        let mut slot = slot.borrow_mut();
        let stale = slot.as_ref().map_or(true, |ctx| ctx.query.max_nodes() != config.max_search_nodes.max(1));
        if stale {
            let seed = config.rng_seed.map(|s| s ^ thread_seed_salt());
            *slot = Some(NavQueryContext::new(config.max_search_nodes, seed));
        }
        match slot.as_mut() {
            Some(ctx) => f(ctx),
            None => f(&mut NavQueryContext::from_config(config)),
        }
    })
}

fn thread_seed_salt() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish()
}
