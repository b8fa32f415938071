//! Mode-routed worker pools for queue-style world generation.
//!
//! Work submitted through a [`Runtime`]'s queue executor runs on one of two
//! lazily created pools, picked on every submission from the host's current
//! state: the wall pool while the wall is shown (or while background
//! generation is disabled), the background pool otherwise. A third, locked
//! pool serves locked entries regardless of mode. Each pool has its own
//! thread count and thread priority, read from configuration when the pool is
//! first needed.
//!
//! Consumers that already own an executor wrap it in an [`ExecutorFacade`]
//! and point the facade at a routing executor while they are queued, then
//! reset it afterwards.
//!
//! # Quick Start
//!
//! ```no_run
//! use seedqueue_executor::prelude::*;
//! use std::sync::Arc;
//!
//! let config = Arc::new(SharedConfig::new(
//!     Config::builder().background(2, 3).wall(1, 4).build().unwrap(),
//! ));
//! let wall = Arc::new(WallFlag::default());
//! let runtime = Runtime::new(config, wall.clone());
//!
//! let server_executor: Arc<dyn Executor> = Arc::new(from_fn(|work: Work| {
//!     work();
//!     Ok(())
//! }));
//! let facade = ExecutorFacade::new(server_executor);
//!
//! facade.set_executor(runtime.queue_executor());
//! facade.spawn(|| println!("generating in the background")).unwrap();
//!
//! wall.set_on_wall(true);
//! facade.spawn(|| println!("generating on the wall pool")).unwrap();
//!
//! facade.reset_executor();
//! runtime.shutdown_managed_pools();
//! ```

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod facade;
pub mod lifecycle;
pub mod prelude;
pub mod registry;
pub mod router;
pub mod runtime;
pub mod state;
pub mod util;

pub use config::{Config, ConfigBuilder, ConfigSource, PoolKind, PoolSettings, SharedConfig};
pub use error::{Error, RejectReason, Result};
pub use executor::{Executor, ExecutorExt, ShutdownReport, Work, WorkerPool};
pub use facade::ExecutorFacade;
pub use registry::PoolRegistry;
pub use router::{ModeRouter, Route, RoutingExecutor};
pub use runtime::{Runtime, RuntimeBuilder};
pub use state::{ModeState, WallFlag};
