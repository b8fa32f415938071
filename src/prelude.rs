pub use crate::config::{Config, ConfigBuilder, ConfigSource, PoolKind, PoolSettings, SharedConfig};
pub use crate::error::{Error, RejectReason, Result};
pub use crate::executor::{
    current_worker, from_fn, Executor, ExecutorExt, PanicStrategy, ShutdownReport, UncaughtHandler, Work,
    WorkerPool,
};
pub use crate::facade::ExecutorFacade;
pub use crate::registry::PoolRegistry;
pub use crate::runtime::Runtime;
pub use crate::state::{ModeState, WallFlag};
