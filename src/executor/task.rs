//! Task representation and execution.

use super::Work;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A unit of work queued on a pool
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) func: Work,
    pub(crate) submit_time: Instant,
}

impl Task {
    pub fn new(func: Work) -> Self {
        Task {
            id: TaskId::next(),
            func,
            submit_time: Instant::now(),
        }
    }

    pub fn execute(self) {
        (self.func)();
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("submit_time", &self.submit_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_task_ids_increase() {
        let a = Task::new(Box::new(|| {}));
        let b = Task::new(Box::new(|| {}));
        assert!(b.id.as_u64() > a.id.as_u64());
    }

    #[test]
    fn test_task_execute_runs_closure() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        Task::new(Box::new(move || flag.store(true, Ordering::SeqCst))).execute();
        assert!(ran.load(Ordering::SeqCst));
    }
}
