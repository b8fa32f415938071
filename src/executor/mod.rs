//! Task execution infrastructure.
//!
//! The [`Executor`] trait is the submission seam everything else is built on:
//! worker pools, routing executors and facades all implement it, so a
//! consumer holding an `Arc<dyn Executor>` never knows which one it has.

pub mod factory;
pub mod panic_handler;
pub mod pool;
pub mod task;
pub mod thread_priority;
pub mod worker;

pub use factory::{PoolFactory, ThreadPoolFactory};
pub use panic_handler::{logging_handler, PanicInfo, PanicStrategy, UncaughtHandler};
pub use pool::{ShutdownReport, WorkerPool};
pub use task::TaskId;
pub use thread_priority::{ThreadPriority, MAX_PRIORITY, MIN_PRIORITY, NORM_PRIORITY};
pub use worker::{current_worker, WorkerInfo};

use crate::error::Result;
use std::sync::Arc;

/// An opaque, zero-argument unit of work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Something that accepts units of work.
///
/// Submission is fire-and-forget: `Ok` means the work was accepted, not that
/// it ran. A rejection is returned to the submitter as-is.
pub trait Executor: Send + Sync {
    fn execute(&self, work: Work) -> Result<()>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, work: Work) -> Result<()> {
        (**self).execute(work)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, work: Work) -> Result<()> {
        (**self).execute(work)
    }
}

/// Closure-friendly submission.
pub trait ExecutorExt: Executor {
    fn spawn<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(Box::new(f))
    }
}

impl<E: Executor + ?Sized> ExecutorExt for E {}

/// Adapts a function into an [`Executor`].
pub struct FnExecutor<F> {
    f: F,
}

pub fn from_fn<F>(f: F) -> FnExecutor<F>
where
    F: Fn(Work) -> Result<()> + Send + Sync,
{
    FnExecutor { f }
}

impl<F> Executor for FnExecutor<F>
where
    F: Fn(Work) -> Result<()> + Send + Sync,
{
    fn execute(&self, work: Work) -> Result<()> {
        (self.f)(work)
    }
}

impl<F> std::fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}
