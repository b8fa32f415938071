use crate::error::{Error, Result};
use crate::executor::thread_priority::{MAX_PRIORITY, MIN_PRIORITY, NORM_PRIORITY};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Upper bound on worker threads for a single pool.
pub const MAX_THREADS: usize = 1024;

/// Grace period granted to a pool during managed shutdown before it is
/// forcibly terminated.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// The three pools the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Work generated while the host is in its queue state.
    Background,
    /// Work generated while the host shows the wall.
    Wall,
    /// Work belonging to locked entries, independent of mode.
    Locked,
}

impl PoolKind {
    pub const ALL: [PoolKind; 3] = [PoolKind::Background, PoolKind::Wall, PoolKind::Locked];

    /// Diagnostic pool name, used in worker thread names.
    pub fn pool_name(self) -> &'static str {
        match self {
            PoolKind::Background => "SeedQueue",
            PoolKind::Wall => "SeedQueue Wall",
            PoolKind::Locked => "SeedQueue Locked",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pool_name())
    }
}

/// Sizing and priority for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Worker count; `None` resolves to the number of logical CPUs.
    pub threads: Option<usize>,
    /// Thread priority on the `1..=10` scale.
    pub priority: i32,
    /// Maximum queued-but-unstarted units of work; `None` is unbounded.
    pub queue_capacity: Option<usize>,
}

impl PoolSettings {
    pub fn new(threads: usize, priority: i32) -> Self {
        Self {
            threads: Some(threads),
            priority,
            queue_capacity: None,
        }
    }

    pub fn auto(priority: i32) -> Self {
        Self {
            threads: None,
            priority,
            queue_capacity: None,
        }
    }

    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    fn validate(&self, kind: PoolKind) -> Result<()> {
        if let Some(n) = self.threads {
            if n > MAX_THREADS {
                return Err(Error::config(format!(
                    "{kind}: threads too large ({n}, max {MAX_THREADS})"
                )));
            }
        }

        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return Err(Error::config(format!(
                "{kind}: priority {} outside {MIN_PRIORITY}..={MAX_PRIORITY}",
                self.priority
            )));
        }

        if self.queue_capacity == Some(0) {
            return Err(Error::config(format!("{kind}: queue_capacity must be > 0")));
        }

        Ok(())
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::auto(NORM_PRIORITY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub background: PoolSettings,
    pub wall: PoolSettings,
    pub locked: PoolSettings,

    /// Maximum number of entries generating concurrently in the background.
    /// Zero disables background generation and forces wall routing.
    pub max_concurrently: usize,

    pub shutdown_grace_ms: u64,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            background: PoolSettings::auto(3),
            wall: PoolSettings::auto(4),
            locked: PoolSettings::auto(4),
            max_concurrently: 1,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE.as_millis() as u64,
            stack_size: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        for kind in PoolKind::ALL {
            self.settings(kind).validate(kind)?;
        }

        if self.stack_size == Some(0) {
            return Err(Error::config("stack_size must be > 0"));
        }

        Ok(())
    }

    pub fn settings(&self, kind: PoolKind) -> &PoolSettings {
        match kind {
            PoolKind::Background => &self.background,
            PoolKind::Wall => &self.wall,
            PoolKind::Locked => &self.locked,
        }
    }

    pub fn settings_mut(&mut self, kind: PoolKind) -> &mut PoolSettings {
        match kind {
            PoolKind::Background => &mut self.background,
            PoolKind::Wall => &mut self.wall,
            PoolKind::Locked => &mut self.locked,
        }
    }
}

/// Read-only view of the host configuration store.
///
/// Values are read when a pool is created and on every routing decision, so
/// implementations should be cheap.
pub trait ConfigSource: Send + Sync {
    fn pool_settings(&self, kind: PoolKind) -> PoolSettings;

    fn max_concurrently(&self) -> usize;

    fn shutdown_grace(&self) -> Duration {
        DEFAULT_SHUTDOWN_GRACE
    }

    fn stack_size(&self) -> Option<usize> {
        None
    }
}

impl ConfigSource for Config {
    fn pool_settings(&self, kind: PoolKind) -> PoolSettings {
        self.settings(kind).clone()
    }

    fn max_concurrently(&self) -> usize {
        self.max_concurrently
    }

    fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }
}

/// A `Config` the host can change while the runtime is live.
#[derive(Debug, Default)]
pub struct SharedConfig {
    inner: RwLock<Config>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    pub fn snapshot(&self) -> Config {
        self.inner.read().clone()
    }

    /// Applies `f` to the stored config. The change is discarded if the
    /// result fails validation.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut guard = self.inner.write();
        let mut next = guard.clone();
        f(&mut next);
        next.validate()?;
        *guard = next;
        Ok(())
    }
}

impl ConfigSource for SharedConfig {
    fn pool_settings(&self, kind: PoolKind) -> PoolSettings {
        self.inner.read().settings(kind).clone()
    }

    fn max_concurrently(&self) -> usize {
        self.inner.read().max_concurrently
    }

    fn shutdown_grace(&self) -> Duration {
        self.inner.read().shutdown_grace()
    }

    fn stack_size(&self) -> Option<usize> {
        self.inner.read().stack_size
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn background(mut self, threads: usize, priority: i32) -> Self {
        self.config.background = PoolSettings::new(threads, priority);
        self
    }

    pub fn wall(mut self, threads: usize, priority: i32) -> Self {
        self.config.wall = PoolSettings::new(threads, priority);
        self
    }

    pub fn locked(mut self, threads: usize, priority: i32) -> Self {
        self.config.locked = PoolSettings::new(threads, priority);
        self
    }

    pub fn max_concurrently(mut self, n: usize) -> Self {
        self.config.max_concurrently = n;
        self
    }

    pub fn queue_capacity(mut self, kind: PoolKind, capacity: usize) -> Self {
        self.config.settings_mut(kind).queue_capacity = Some(capacity);
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace_ms = grace.as_millis() as u64;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
