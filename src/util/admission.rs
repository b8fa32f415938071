//! Queue admission control.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks queued-but-unstarted work and refuses new work past a capacity.
#[derive(Debug)]
pub struct QueueAdmission {
    capacity: Option<usize>,
    queued: AtomicUsize,
}

impl QueueAdmission {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            queued: AtomicUsize::new(0),
        }
    }

    /// Reserve a queue slot. Returns `false` if the queue is full.
    pub fn try_admit(&self) -> bool {
        let current = self.queued.fetch_add(1, Ordering::AcqRel);

        match self.capacity {
            Some(max) if current >= max => {
                self.queued.fetch_sub(1, Ordering::AcqRel);
                false
            }
            _ => true,
        }
    }

    /// Release a slot once its work has been taken off the queue.
    pub fn release(&self) {
        self.queued.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for QueueAdmission {
    fn default() -> Self {
        Self::new(None)
    }
}
