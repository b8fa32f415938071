use super::panic_handler::UncaughtHandler;
use super::task::Task;
use super::thread_priority::ThreadPriority;
use super::worker::{Worker, WorkerInfo};
use super::{Executor, Work};
use crate::error::{Error, RejectReason, Result};
use crate::util::QueueAdmission;
use crossbeam_deque::{Injector, Steal};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const RUNNING: u8 = 0;
const SHUTTING_DOWN: u8 = 1;
const TERMINATED: u8 = 2;

/// Upper bound on how long an idle worker sleeps before rechecking the queue.
const IDLE_WAIT: Duration = Duration::from_millis(250);

/// Parked workers and the wakeups already promised to some of them.
///
/// A submitter that finds a parked worker moves it from `parked` to
/// `wakeups` before notifying, so the next submitter no longer counts it as
/// available. Every worker leaving the wait takes back one unit from
/// `wakeups`, or from `parked` when none is owed.
#[derive(Debug, Default)]
struct IdleWorkers {
    parked: usize,
    wakeups: usize,
}

/// State shared between a pool handle and its workers.
pub(crate) struct PoolShared {
    pub(crate) name: Arc<str>,
    injector: Injector<Task>,
    pub(crate) admission: QueueAdmission,
    pub(crate) handler: UncaughtHandler,
    state: AtomicU8,
    // held for reading around every steal, for writing by `terminate`
    gate: RwLock<()>,
    idle: Mutex<IdleWorkers>,
    work_available: Condvar,
    live: Mutex<usize>,
    all_exited: Condvar,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl PoolShared {
    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    fn is_terminated(&self) -> bool {
        self.state() == TERMINATED
    }

    /// Takes the next queued task, or `None` once the pool is terminated.
    /// No task leaves the queue after `terminate` returns.
    pub(crate) fn steal(&self) -> Option<Steal<Task>> {
        let _gate = self.gate.read();
        if self.is_terminated() {
            return None;
        }
        Some(self.injector.steal())
    }

    fn terminate(&self) {
        let _gate = self.gate.write();
        self.state.store(TERMINATED, Ordering::Release);
    }

    /// Parks the calling worker until work shows up. Returns `false` when the
    /// worker should exit.
    pub(crate) fn wait_for_work(&self) -> bool {
        let mut idle = self.idle.lock();

        if !self.injector.is_empty() {
            return true;
        }
        if self.state() != RUNNING {
            return false;
        }

        idle.parked += 1;
        self.work_available.wait_for(&mut idle, IDLE_WAIT);
        if idle.wakeups > 0 {
            idle.wakeups -= 1;
        } else {
            idle.parked -= 1;
        }
        true
    }

    fn parked_workers(&self) -> usize {
        self.idle.lock().parked
    }

    /// Queues `task` for a parked worker and wakes it. Hands the task back
    /// when no worker is parked.
    fn hand_to_parked(&self, task: Task) -> std::result::Result<(), Task> {
        let mut idle = self.idle.lock();
        if idle.parked == 0 {
            return Err(task);
        }
        idle.parked -= 1;
        idle.wakeups += 1;
        self.injector.push(task);
        self.work_available.notify_one();
        Ok(())
    }

    fn wake_parked(&self) {
        let mut idle = self.idle.lock();
        if idle.parked > 0 {
            idle.parked -= 1;
            idle.wakeups += 1;
            self.work_available.notify_one();
        }
    }

    fn notify_all(&self) {
        let _idle = self.idle.lock();
        self.work_available.notify_all();
    }

    fn worker_started(&self) {
        *self.live.lock() += 1;
    }

    pub(crate) fn worker_exited(&self) {
        let mut live = self.live.lock();
        *live -= 1;
        if *live == 0 {
            self.all_exited.notify_all();
        }
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Drops everything still queued and returns how many tasks were lost.
    fn drain(&self) -> usize {
        let mut dropped = 0;
        loop {
            match self.injector.steal() {
                Steal::Success(task) => {
                    self.admission.release();
                    drop(task);
                    dropped += 1;
                }
                Steal::Retry => continue,
                Steal::Empty => break,
            }
        }
        dropped
    }
}

/// Outcome of shutting down one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub pool: String,
    /// Queued tasks discarded because the grace period ran out.
    pub abandoned_tasks: usize,
    /// Workers still busy when the grace period ran out; left detached.
    pub detached_workers: usize,
}

impl ShutdownReport {
    /// Whether every admitted task ran and every worker exited in time.
    pub fn is_clean(&self) -> bool {
        self.abandoned_tasks == 0 && self.detached_workers == 0
    }
}

/// A named, fixed-priority worker pool.
///
/// Workers are spawned on demand as work arrives, up to `parallelism`, and
/// are named `Worker-<name>-<n>` with `n` counting up from zero.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    parallelism: usize,
    priority: ThreadPriority,
    stack_size: Option<usize>,
    spawned: AtomicUsize,
    next_index: AtomicUsize,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub(crate) fn new(
        name: &str,
        parallelism: usize,
        priority: ThreadPriority,
        queue_capacity: Option<usize>,
        handler: UncaughtHandler,
        stack_size: Option<usize>,
    ) -> Self {
        let shared = Arc::new(PoolShared {
            name: Arc::from(name),
            injector: Injector::new(),
            admission: QueueAdmission::new(queue_capacity),
            handler,
            state: AtomicU8::new(RUNNING),
            gate: RwLock::new(()),
            idle: Mutex::new(IdleWorkers::default()),
            work_available: Condvar::new(),
            live: Mutex::new(0),
            all_exited: Condvar::new(),
            completed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
        });

        Self {
            shared,
            parallelism,
            priority,
            stack_size,
            spawned: AtomicUsize::new(0),
            next_index: AtomicUsize::new(0),
            handles: Mutex::new(Vec::with_capacity(parallelism)),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn priority(&self) -> ThreadPriority {
        self.priority
    }

    pub fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    /// Number of worker threads started so far.
    pub fn spawned_workers(&self) -> usize {
        self.spawned.load(Ordering::Acquire)
    }

    /// Tasks admitted but not yet picked up by a worker.
    pub fn pending_tasks(&self) -> usize {
        self.shared.admission.queued()
    }

    pub fn completed_tasks(&self) -> u64 {
        self.shared.completed.load(Ordering::Relaxed)
    }

    pub fn panicked_tasks(&self) -> u64 {
        self.shared.panicked.load(Ordering::Relaxed)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.state() != RUNNING
    }

    fn submit(&self, task: Task) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::rejected(self.name(), RejectReason::NoWorkers));
        }
        if self.is_shutdown() {
            return Err(Error::rejected(self.name(), RejectReason::ShutDown));
        }
        if !self.shared.admission.try_admit() {
            return Err(Error::rejected(self.name(), RejectReason::Saturated));
        }

        let task = match self.shared.hand_to_parked(task) {
            Ok(()) => return Ok(()),
            Err(task) => task,
        };

        if let Err(e) = self.ensure_worker() {
            self.shared.admission.release();
            return Err(e);
        }

        self.shared.injector.push(task);
        // a worker may have parked since we looked
        self.shared.wake_parked();
        Ok(())
    }

    /// Starts another worker if the pool has room. Called only when no
    /// parked worker could take the task.
    fn ensure_worker(&self) -> Result<()> {
        let reserved = self
            .spawned
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.parallelism).then_some(n + 1)
            });
        if reserved.is_err() {
            return Ok(());
        }

        match self.spawn_worker() {
            Ok(()) => Ok(()),
            Err(e) => {
                let remaining = self.spawned.fetch_sub(1, Ordering::AcqRel) - 1;
                if remaining == 0 {
                    Err(e)
                } else {
                    // existing workers will pick the task up
                    tracing::warn!(pool = self.name(), error = %e, "could not add worker");
                    Ok(())
                }
            }
        }
    }

    fn spawn_worker(&self) -> Result<()> {
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let info = WorkerInfo::new(self.shared.name.clone(), index, self.priority);

        let mut builder = thread::Builder::new().name(info.name().to_string());
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        tracing::debug!(
            pool = self.name(),
            worker = info.name(),
            priority = self.priority.get(),
            "spawning worker"
        );

        self.shared.worker_started();
        let worker = Worker::new(info, self.shared.clone());
        match builder.spawn(move || worker.run()) {
            Ok(handle) => {
                self.handles.lock().push(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.worker_exited();
                Err(Error::executor(format!("spawn failed: {e}")))
            }
        }
    }

    /// Stops admitting work, lets queued and running work finish for up to
    /// `grace`, then discards whatever is still queued and detaches workers
    /// that are still busy. Calling it again is harmless.
    pub fn shutdown(&self, grace: Duration) -> ShutdownReport {
        let _ = self.shared.state.compare_exchange(
            RUNNING,
            SHUTTING_DOWN,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.shared.notify_all();

        let deadline = Instant::now() + grace;
        let detached_workers = {
            let mut live = self.shared.live.lock();
            while *live > 0 {
                if self.shared.all_exited.wait_until(&mut live, deadline).timed_out() {
                    break;
                }
            }
            *live
        };

        self.shared.terminate();
        self.shared.notify_all();

        let abandoned_tasks = if detached_workers > 0 {
            let dropped = self.shared.drain();
            tracing::warn!(
                pool = self.name(),
                busy_workers = detached_workers,
                dropped_tasks = dropped,
                grace_ms = grace.as_millis() as u64,
                "pool did not terminate in time, forcing shutdown"
            );
            dropped
        } else {
            0
        };

        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            if detached_workers == 0 || handle.is_finished() {
                let _ = handle.join();
            }
        }

        tracing::debug!(
            pool = self.name(),
            completed = self.completed_tasks(),
            "pool shut down"
        );

        ShutdownReport {
            pool: self.name().to_string(),
            abandoned_tasks,
            detached_workers,
        }
    }
}

impl Executor for WorkerPool {
    fn execute(&self, work: Work) -> Result<()> {
        self.submit(Task::new(work))
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name())
            .field("parallelism", &self.parallelism)
            .field("priority", &self.priority)
            .field("stack_size", &self.stack_size)
            .field("spawned", &self.spawned_workers())
            .field("parked", &self.shared.parked_workers())
            .field("pending", &self.pending_tasks())
            .field("capacity", &self.shared.admission.capacity())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers may still hold the shared state; tell them to stop without
        // waiting, since the last handle can be dropped on a worker thread.
        if !self.shared.is_terminated() {
            self.shared.terminate();
            self.shared.notify_all();
            self.shared.drain();
        }
    }
}
