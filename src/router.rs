//! Mode-based pool selection.

use crate::config::{ConfigSource, PoolKind};
use crate::error::Result;
use crate::executor::{Executor, Work, WorkerPool};
use crate::registry::PoolRegistry;
use crate::state::ModeState;
use std::sync::Arc;

/// Pool that should serve queue work given the host's current state.
///
/// The wall pool serves everything while the wall is shown, and also when
/// background generation is disabled, so the background pool is never built
/// in that case.
pub fn select_queue_pool(on_wall: bool, max_concurrently: usize) -> PoolKind {
    if on_wall || max_concurrently == 0 {
        PoolKind::Wall
    } else {
        PoolKind::Background
    }
}

pub struct ModeRouter {
    registry: Arc<PoolRegistry>,
    mode: Arc<dyn ModeState>,
}

impl ModeRouter {
    pub fn new(registry: Arc<PoolRegistry>, mode: Arc<dyn ModeState>) -> Self {
        Self { registry, mode }
    }

    pub fn queue_pool_kind(&self) -> PoolKind {
        select_queue_pool(
            self.mode.is_on_wall(),
            self.registry.config().max_concurrently(),
        )
    }

    pub fn resolve_background_or_wall_pool(&self) -> Result<Arc<WorkerPool>> {
        self.registry.get_or_create(self.queue_pool_kind())
    }

    pub fn resolve_locked_pool(&self) -> Result<Arc<WorkerPool>> {
        self.registry.get_or_create_locked_pool()
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for ModeRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeRouter")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Background or wall pool, decided per submission.
    Queue,
    Locked,
}

/// Executor that resolves its target pool on every submission.
#[derive(Debug)]
pub struct RoutingExecutor {
    router: Arc<ModeRouter>,
    route: Route,
}

impl RoutingExecutor {
    pub fn new(router: Arc<ModeRouter>, route: Route) -> Self {
        Self { router, route }
    }

    pub fn route(&self) -> Route {
        self.route
    }
}

impl Executor for RoutingExecutor {
    fn execute(&self, work: Work) -> Result<()> {
        let pool = match self.route {
            Route::Queue => self.router.resolve_background_or_wall_pool()?,
            Route::Locked => self.router.resolve_locked_pool()?,
        };
        pool.execute(work)
    }
}
