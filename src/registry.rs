//! Lazily created, per-kind singleton worker pools.

use crate::config::{ConfigSource, PoolKind};
use crate::error::Result;
use crate::executor::{PoolFactory, WorkerPool};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct Pools {
    pub(crate) background: Option<Arc<WorkerPool>>,
    pub(crate) wall: Option<Arc<WorkerPool>>,
    pub(crate) locked: Option<Arc<WorkerPool>>,
}

impl Pools {
    pub(crate) fn slot(&mut self, kind: PoolKind) -> &mut Option<Arc<WorkerPool>> {
        match kind {
            PoolKind::Background => &mut self.background,
            PoolKind::Wall => &mut self.wall,
            PoolKind::Locked => &mut self.locked,
        }
    }

    fn get(&self, kind: PoolKind) -> Option<&Arc<WorkerPool>> {
        match kind {
            PoolKind::Background => self.background.as_ref(),
            PoolKind::Wall => self.wall.as_ref(),
            PoolKind::Locked => self.locked.as_ref(),
        }
    }
}

/// Owns the background, wall and locked pools of one session.
///
/// Each pool is built the first time it is asked for, using the settings the
/// config source reports at that moment, and the same instance is returned
/// until it is shut down.
pub struct PoolRegistry {
    pub(crate) config: Arc<dyn ConfigSource>,
    factory: Arc<dyn PoolFactory>,
    pub(crate) pools: RwLock<Pools>,
}

impl PoolRegistry {
    pub fn new(config: Arc<dyn ConfigSource>, factory: Arc<dyn PoolFactory>) -> Self {
        Self {
            config,
            factory,
            pools: RwLock::new(Pools::default()),
        }
    }

    pub fn get_or_create_background_pool(&self) -> Result<Arc<WorkerPool>> {
        self.get_or_create(PoolKind::Background)
    }

    pub fn get_or_create_wall_pool(&self) -> Result<Arc<WorkerPool>> {
        self.get_or_create(PoolKind::Wall)
    }

    pub fn get_or_create_locked_pool(&self) -> Result<Arc<WorkerPool>> {
        self.get_or_create(PoolKind::Locked)
    }

    pub fn get_or_create(&self, kind: PoolKind) -> Result<Arc<WorkerPool>> {
        if let Some(pool) = self.pools.read().get(kind) {
            return Ok(pool.clone());
        }

        let mut pools = self.pools.write();
        let slot = pools.slot(kind);
        if let Some(pool) = slot {
            return Ok(pool.clone());
        }

        let settings = self.config.pool_settings(kind);
        let pool = Arc::new(self.factory.create_pool(kind.pool_name(), &settings)?);
        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// The pool for `kind` if it has been created, without creating it.
    pub fn pool(&self, kind: PoolKind) -> Option<Arc<WorkerPool>> {
        self.pools.read().get(kind).cloned()
    }

    pub fn config(&self) -> &Arc<dyn ConfigSource> {
        &self.config
    }
}

impl std::fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("pools", &*self.pools.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{Config, PoolSettings, SharedConfig};
    use crate::executor::{PanicStrategy, ThreadPoolFactory};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    /// Factory that counts how many pools it has built.
    pub(crate) struct CountingFactory {
        inner: ThreadPoolFactory,
        pub(crate) created: AtomicUsize,
    }

    impl CountingFactory {
        pub(crate) fn new() -> Self {
            Self {
                inner: ThreadPoolFactory::new(PanicStrategy::Isolate.handler()),
                created: AtomicUsize::new(0),
            }
        }

        pub(crate) fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }
    }

    impl PoolFactory for CountingFactory {
        fn create_pool(&self, name: &str, settings: &PoolSettings) -> Result<WorkerPool> {
            self.created.fetch_add(1, Ordering::SeqCst);
            // widen the race window
            thread::sleep(Duration::from_millis(5));
            self.inner.create_pool(name, settings)
        }
    }

    fn registry(config: Config) -> (PoolRegistry, Arc<CountingFactory>) {
        let factory = Arc::new(CountingFactory::new());
        let registry = PoolRegistry::new(Arc::new(config), factory.clone());
        (registry, factory)
    }

    #[test]
    fn test_same_instance_returned() {
        let (registry, factory) = registry(Config::default());

        let a = registry.get_or_create_wall_pool().unwrap();
        let b = registry.get_or_create_wall_pool().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.created(), 1);
        assert_eq!(a.name(), "SeedQueue Wall");
    }

    #[test]
    fn test_single_pool_under_race() {
        for kind in PoolKind::ALL {
            let (registry, factory) = registry(Config::default());
            let registry = Arc::new(registry);
            let barrier = Arc::new(Barrier::new(16));

            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let registry = registry.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        registry.get_or_create(kind).unwrap()
                    })
                })
                .collect();

            let pools: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            assert_eq!(factory.created(), 1, "{kind} built more than once");
            assert!(pools.iter().all(|p| Arc::ptr_eq(p, &pools[0])));
        }
    }

    #[test]
    fn test_settings_snapshot_at_creation() {
        let shared = Arc::new(SharedConfig::new(
            Config::builder().background(2, 5).build().unwrap(),
        ));
        let registry = PoolRegistry::new(
            shared.clone(),
            Arc::new(ThreadPoolFactory::new(PanicStrategy::Isolate.handler())),
        );

        let pool = registry.get_or_create_background_pool().unwrap();
        shared
            .update(|c| c.background = PoolSettings::new(8, 9))
            .unwrap();

        let again = registry.get_or_create_background_pool().unwrap();
        assert!(Arc::ptr_eq(&pool, &again));
        assert_eq!(again.parallelism(), 2);
        assert_eq!(again.priority().get(), 5);
    }

    #[test]
    fn test_pool_peek_does_not_create() {
        let (registry, factory) = registry(Config::default());

        assert!(registry.pool(PoolKind::Locked).is_none());
        assert_eq!(factory.created(), 0);

        registry.get_or_create_locked_pool().unwrap();
        assert!(registry.pool(PoolKind::Locked).is_some());
        assert!(registry.pool(PoolKind::Background).is_none());
    }

    #[test]
    fn test_creation_error_leaves_slot_empty() {
        let mut config = Config::default();
        // bypasses validate(), as a misbehaving config store might
        config.wall.priority = 42;
        let (registry, factory) = registry(config);

        assert!(registry.get_or_create_wall_pool().is_err());
        assert!(registry.pool(PoolKind::Wall).is_none());
        assert_eq!(factory.created(), 1);
    }
}
