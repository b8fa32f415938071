//! Host application mode.

use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the host is currently showing the wall.
///
/// Queried on every routing decision.
pub trait ModeState: Send + Sync {
    fn is_on_wall(&self) -> bool;
}

/// A settable wall-mode flag.
#[derive(Debug, Default)]
pub struct WallFlag {
    on_wall: AtomicBool,
}

impl WallFlag {
    pub fn new(on_wall: bool) -> Self {
        Self {
            on_wall: AtomicBool::new(on_wall),
        }
    }

    pub fn set_on_wall(&self, on_wall: bool) {
        self.on_wall.store(on_wall, Ordering::Release);
    }
}

impl ModeState for WallFlag {
    fn is_on_wall(&self) -> bool {
        self.on_wall.load(Ordering::Acquire)
    }
}
