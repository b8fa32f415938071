//! Host-scale thread priorities and their mapping onto the OS scheduler.

use crate::error::{Error, Result};

pub const MIN_PRIORITY: i32 = 1;
pub const NORM_PRIORITY: i32 = 5;
pub const MAX_PRIORITY: i32 = 10;

/// Nice-value distance per priority step.
const NICE_STEP: i32 = 2;

/// A priority on the host's `1..=10` scale, where 5 is normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadPriority(i32);

impl ThreadPriority {
    pub fn new(value: i32) -> Result<Self> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&value) {
            return Err(Error::config(format!(
                "thread priority {value} outside {MIN_PRIORITY}..={MAX_PRIORITY}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// Equivalent nice value: normal maps to 0, higher priority to lower nice.
    pub fn nice(self) -> i32 {
        (NORM_PRIORITY - self.0) * NICE_STEP
    }
}

impl Default for ThreadPriority {
    fn default() -> Self {
        Self(NORM_PRIORITY)
    }
}

/// Applies `priority` to the calling thread. Failures are logged, not raised;
/// a worker at the wrong priority still does useful work.
#[cfg(target_os = "linux")]
pub(crate) fn apply_to_current_thread(priority: ThreadPriority) {
    let nice = priority.nice();
    unsafe {
        let tid = libc::syscall(libc::SYS_gettid) as libc::id_t;
        if libc::setpriority(libc::PRIO_PROCESS, tid, nice) != 0 {
            tracing::debug!(
                thread = std::thread::current().name().unwrap_or("unknown"),
                priority = priority.get(),
                nice,
                error = %std::io::Error::last_os_error(),
                "failed to apply thread priority"
            );
        }
    }
}

/// Nice value the scheduler currently holds for the calling thread.
#[cfg(all(test, target_os = "linux"))]
pub(crate) fn current_nice() -> i32 {
    unsafe {
        let tid = libc::syscall(libc::SYS_gettid) as libc::id_t;
        libc::getpriority(libc::PRIO_PROCESS, tid)
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn apply_to_current_thread(priority: ThreadPriority) {
    tracing::trace!(
        priority = priority.get(),
        "thread priority not applied on this platform"
    );
}
