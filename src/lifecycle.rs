//! Session teardown for the managed pools.

use crate::config::{ConfigSource, PoolKind};
use crate::executor::ShutdownReport;
use crate::registry::PoolRegistry;

/// Pools torn down by [`PoolRegistry::shutdown_managed_pools`], in order.
///
/// The locked pool is not listed: it outlives the session and is stopped by
/// whoever owns locked work.
pub const MANAGED_POOLS: [PoolKind; 2] = [PoolKind::Background, PoolKind::Wall];

impl PoolRegistry {
    /// Shuts down and forgets the background and wall pools.
    ///
    /// Call this only after every consumer has stopped submitting; work that
    /// arrives during shutdown may or may not run. A later routing call builds
    /// a fresh pool. Pools that outlast the grace period are force-terminated
    /// and reported, never raised as an error.
    pub fn shutdown_managed_pools(&self) -> Vec<ShutdownReport> {
        let grace = self.config.shutdown_grace();
        let mut reports = Vec::with_capacity(MANAGED_POOLS.len());

        for kind in MANAGED_POOLS {
            // detach under the lock, wait outside it
            let pool = self.pools.write().slot(kind).take();
            let Some(pool) = pool else {
                continue;
            };

            tracing::info!(pool = pool.name(), "shutting down pool");
            let report = pool.shutdown(grace);
            if !report.is_clean() {
                tracing::warn!(
                    pool = %report.pool,
                    abandoned_tasks = report.abandoned_tasks,
                    detached_workers = report.detached_workers,
                    "pool force-terminated"
                );
            }
            reports.push(report);
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::executor::{ExecutorExt, PanicStrategy, ThreadPoolFactory};
    use crossbeam_channel::bounded;
    use std::sync::Arc;
    use std::time::Duration;

    fn registry() -> PoolRegistry {
        PoolRegistry::new(
            Arc::new(Config::default()),
            Arc::new(ThreadPoolFactory::new(PanicStrategy::Isolate.handler())),
        )
    }

    #[test]
    fn test_shutdown_nothing_created() {
        assert!(registry().shutdown_managed_pools().is_empty());
    }

    #[test]
    fn test_shutdown_order_and_reset() {
        let registry = registry();
        let wall = registry.get_or_create_wall_pool().unwrap();
        let background = registry.get_or_create_background_pool().unwrap();

        let reports = registry.shutdown_managed_pools();
        let names: Vec<_> = reports.iter().map(|r| r.pool.as_str()).collect();
        assert_eq!(names, ["SeedQueue", "SeedQueue Wall"]);
        assert!(reports.iter().all(ShutdownReport::is_clean));

        assert!(wall.is_shutdown());
        assert!(background.is_shutdown());
        assert!(registry.pool(PoolKind::Wall).is_none());
        assert!(registry.pool(PoolKind::Background).is_none());

        let fresh = registry.get_or_create_wall_pool().unwrap();
        assert!(!Arc::ptr_eq(&fresh, &wall));
        assert!(!fresh.is_shutdown());
    }

    #[test]
    fn test_locked_pool_survives() {
        let registry = registry();
        let locked = registry.get_or_create_locked_pool().unwrap();
        registry.get_or_create_background_pool().unwrap();

        registry.shutdown_managed_pools();

        let same = registry.get_or_create_locked_pool().unwrap();
        assert!(Arc::ptr_eq(&locked, &same));
        assert!(!same.is_shutdown());

        let (tx, rx) = bounded(1);
        same.spawn(move || tx.send(()).unwrap()).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let registry = registry();
        registry.get_or_create_background_pool().unwrap();

        assert_eq!(registry.shutdown_managed_pools().len(), 1);
        assert!(registry.shutdown_managed_pools().is_empty());
    }
}
