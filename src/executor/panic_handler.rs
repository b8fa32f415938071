use super::task::TaskId;
use super::worker::WorkerInfo;
use std::any::Any;
use std::sync::Arc;

/// Callback invoked for every panic that escapes a unit of work.
///
/// Runs on the worker thread that caught the panic. The worker keeps serving
/// the pool afterwards.
pub type UncaughtHandler = Arc<dyn Fn(&WorkerInfo, &PanicInfo) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicStrategy {
    /// Swallow the panic silently.
    Isolate,
    /// Log the panic at error level.
    LogAndContinue,
}

impl Default for PanicStrategy {
    fn default() -> Self {
        PanicStrategy::LogAndContinue
    }
}

impl PanicStrategy {
    pub fn handler(self) -> UncaughtHandler {
        match self {
            PanicStrategy::Isolate => Arc::new(|_: &WorkerInfo, _: &PanicInfo| {}),
            PanicStrategy::LogAndContinue => Arc::new(|worker: &WorkerInfo, info: &PanicInfo| {
                tracing::error!(
                    worker = worker.name(),
                    pool = worker.pool(),
                    task = info.task.as_u64(),
                    message = %info.message,
                    "task panicked"
                );
            }),
        }
    }
}

/// Handler that logs the panic and lets the worker continue.
pub fn logging_handler() -> UncaughtHandler {
    PanicStrategy::LogAndContinue.handler()
}

#[derive(Debug, Clone)]
pub struct PanicInfo {
    pub task: TaskId,
    pub message: String,
}

impl PanicInfo {
    pub(crate) fn from_payload(task: TaskId, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        Self { task, message }
    }
}
