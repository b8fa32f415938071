// worker thread stuff
use super::panic_handler::PanicInfo;
use super::pool::PoolShared;
use super::task::Task;
use super::thread_priority::{self, ThreadPriority};
use crossbeam_deque::Steal;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;

thread_local! {
    static CURRENT_WORKER: RefCell<Option<WorkerInfo>> = RefCell::new(None);
}

/// Identity of a pool worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInfo {
    pool: Arc<str>,
    name: String,
    index: usize,
    priority: ThreadPriority,
}

impl WorkerInfo {
    pub(crate) fn new(pool: Arc<str>, index: usize, priority: ThreadPriority) -> Self {
        let name = format!("Worker-{pool}-{index}");
        Self {
            pool,
            name,
            index,
            priority,
        }
    }

    pub fn pool(&self) -> &str {
        &self.pool
    }

    /// Thread name, `Worker-<pool>-<index>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn priority(&self) -> ThreadPriority {
        self.priority
    }
}

/// Identity of the pool worker running the caller, if any.
pub fn current_worker() -> Option<WorkerInfo> {
    CURRENT_WORKER.with(|w| w.borrow().clone())
}

pub(crate) struct Worker {
    info: WorkerInfo,
    shared: Arc<PoolShared>,
}

impl Worker {
    pub fn new(info: WorkerInfo, shared: Arc<PoolShared>) -> Self {
        Self { info, shared }
    }

    // main loop
    pub fn run(self) {
        CURRENT_WORKER.with(|w| *w.borrow_mut() = Some(self.info.clone()));
        thread_priority::apply_to_current_thread(self.info.priority);

        loop {
            let steal = match self.shared.steal() {
                Some(steal) => steal,
                None => break,
            };

            match steal {
                Steal::Success(task) => {
                    self.shared.admission.release();
                    self.execute_task(task);
                }
                Steal::Retry => continue,
                Steal::Empty => {
                    // false once the pool is shutting down and drained
                    if !self.shared.wait_for_work() {
                        break;
                    }
                }
            }
        }

        tracing::trace!(worker = self.info.name(), "worker exiting");
        CURRENT_WORKER.with(|w| *w.borrow_mut() = None);
        self.shared.worker_exited();
    }

    fn execute_task(&self, task: Task) {
        let id = task.id;
        let queued_for = task.submit_time.elapsed();
        let start = Instant::now();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            task.execute();
        }));

        match result {
            Ok(()) => {
                self.shared.record_completed();
                tracing::trace!(
                    worker = self.info.name(),
                    task = id.as_u64(),
                    queued_us = queued_for.as_micros() as u64,
                    run_us = start.elapsed().as_micros() as u64,
                    "task finished"
                );
            }
            Err(payload) => {
                self.shared.record_panicked();
                let info = PanicInfo::from_payload(id, payload);
                // a panicking handler must not take the worker down with it
                let handled = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    (self.shared.handler)(&self.info, &info);
                }));
                if handled.is_err() {
                    tracing::error!(
                        worker = self.info.name(),
                        task = id.as_u64(),
                        "uncaught handler panicked"
                    );
                }
            }
        }
    }
}
