use super::panic_handler::UncaughtHandler;
use super::pool::WorkerPool;
use super::thread_priority::ThreadPriority;
use crate::config::{ConfigSource, PoolSettings, MAX_THREADS};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Builds the worker pools the registry hands out.
pub trait PoolFactory: Send + Sync {
    fn create_pool(&self, name: &str, settings: &PoolSettings) -> Result<WorkerPool>;
}

/// Creates [`WorkerPool`]s wired to a shared uncaught-panic handler.
pub struct ThreadPoolFactory {
    handler: UncaughtHandler,
    config: Option<Arc<dyn ConfigSource>>,
}

impl ThreadPoolFactory {
    pub fn new(handler: UncaughtHandler) -> Self {
        Self {
            handler,
            config: None,
        }
    }

    /// Reads process-wide settings such as the worker stack size from
    /// `config` each time a pool is created.
    pub fn with_config_source(mut self, config: Arc<dyn ConfigSource>) -> Self {
        self.config = Some(config);
        self
    }

    /// Shorthand for an unbounded pool of `parallelism` workers.
    pub fn create(&self, name: &str, parallelism: usize, priority: i32) -> Result<WorkerPool> {
        self.create_pool(name, &PoolSettings::new(parallelism, priority))
    }
}

impl PoolFactory for ThreadPoolFactory {
    fn create_pool(&self, name: &str, settings: &PoolSettings) -> Result<WorkerPool> {
        let parallelism = settings.worker_threads();
        if parallelism > MAX_THREADS {
            return Err(Error::config(format!(
                "{name}: parallelism {parallelism} exceeds {MAX_THREADS}"
            )));
        }
        let priority = ThreadPriority::new(settings.priority)?;
        if settings.queue_capacity == Some(0) {
            return Err(Error::config(format!("{name}: queue_capacity must be > 0")));
        }

        let stack_size = self.config.as_ref().and_then(|c| c.stack_size());

        tracing::info!(
            pool = name,
            parallelism,
            priority = priority.get(),
            queue_capacity = ?settings.queue_capacity,
            stack_size = ?stack_size,
            "creating worker pool"
        );

        Ok(WorkerPool::new(
            name,
            parallelism,
            priority,
            settings.queue_capacity,
            self.handler.clone(),
            stack_size,
        ))
    }
}

impl std::fmt::Debug for ThreadPoolFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPoolFactory")
            .field("config_source", &self.config.is_some())
            .finish_non_exhaustive()
    }
}
