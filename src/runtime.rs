use crate::config::ConfigSource;
use crate::executor::{logging_handler, Executor, PoolFactory, ShutdownReport, ThreadPoolFactory, UncaughtHandler};
use crate::registry::PoolRegistry;
use crate::router::{ModeRouter, Route, RoutingExecutor};
use crate::state::ModeState;
use std::sync::Arc;

/// One session's worth of pools, router and shared routing executors.
///
/// Build one per session and hand its executors to consumers; nothing here is
/// global.
pub struct Runtime {
    registry: Arc<PoolRegistry>,
    router: Arc<ModeRouter>,
    queue_executor: Arc<RoutingExecutor>,
    locked_executor: Arc<RoutingExecutor>,
}

impl Runtime {
    pub fn new(config: Arc<dyn ConfigSource>, mode: Arc<dyn ModeState>) -> Self {
        Self::builder(config, mode).build()
    }

    pub fn builder(config: Arc<dyn ConfigSource>, mode: Arc<dyn ModeState>) -> RuntimeBuilder {
        RuntimeBuilder {
            config,
            mode,
            handler: None,
            factory: None,
        }
    }

    /// Routes each submission to the background or wall pool.
    pub fn queue_executor(&self) -> Arc<dyn Executor> {
        self.queue_executor.clone()
    }

    /// Routes every submission to the locked pool.
    pub fn locked_executor(&self) -> Arc<dyn Executor> {
        self.locked_executor.clone()
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Arc<ModeRouter> {
        &self.router
    }

    /// See [`PoolRegistry::shutdown_managed_pools`].
    pub fn shutdown_managed_pools(&self) -> Vec<ShutdownReport> {
        self.registry.shutdown_managed_pools()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

pub struct RuntimeBuilder {
    config: Arc<dyn ConfigSource>,
    mode: Arc<dyn ModeState>,
    handler: Option<UncaughtHandler>,
    factory: Option<Arc<dyn PoolFactory>>,
}

impl RuntimeBuilder {
    /// Handler for panics escaping work units. Defaults to logging them.
    /// Ignored when a custom factory is supplied.
    pub fn uncaught_handler(mut self, handler: UncaughtHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn factory(mut self, factory: Arc<dyn PoolFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn build(self) -> Runtime {
        let factory: Arc<dyn PoolFactory> = match self.factory {
            Some(factory) => factory,
            None => {
                let handler = self.handler.unwrap_or_else(logging_handler);
                Arc::new(ThreadPoolFactory::new(handler).with_config_source(self.config.clone()))
            }
        };

        let registry = Arc::new(PoolRegistry::new(self.config, factory));
        let router = Arc::new(ModeRouter::new(registry.clone(), self.mode));

        Runtime {
            queue_executor: Arc::new(RoutingExecutor::new(router.clone(), Route::Queue)),
            locked_executor: Arc::new(RoutingExecutor::new(router.clone(), Route::Locked)),
            registry,
            router,
        }
    }
}

impl std::fmt::Debug for RuntimeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeBuilder")
            .field("custom_handler", &self.handler.is_some())
            .field("custom_factory", &self.factory.is_some())
            .finish_non_exhaustive()
    }
}
