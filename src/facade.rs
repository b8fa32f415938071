//! Redirectable submission entry point.

use crate::error::Result;
use crate::executor::{Executor, Work};
use parking_lot::RwLock;
use std::sync::Arc;

/// Wraps a fallback executor and forwards work to whichever executor is
/// currently active.
///
/// The owner of a facade points it at another executor with
/// [`set_executor`](Self::set_executor) and restores the fallback with
/// [`reset_executor`](Self::reset_executor). Only one owner is expected to
/// switch targets; any thread may submit.
pub struct ExecutorFacade {
    fallback: Arc<dyn Executor>,
    active: RwLock<Arc<dyn Executor>>,
}

impl ExecutorFacade {
    pub fn new(fallback: Arc<dyn Executor>) -> Self {
        Self {
            active: RwLock::new(fallback.clone()),
            fallback,
        }
    }

    pub fn set_executor(&self, executor: Arc<dyn Executor>) {
        *self.active.write() = executor;
    }

    pub fn reset_executor(&self) {
        self.set_executor(self.fallback.clone());
    }

    pub fn is_overridden(&self) -> bool {
        !Arc::ptr_eq(&*self.active.read(), &self.fallback)
    }

    pub fn fallback(&self) -> &Arc<dyn Executor> {
        &self.fallback
    }
}

impl Executor for ExecutorFacade {
    fn execute(&self, work: Work) -> Result<()> {
        // release the lock before the target runs anything
        let active = self.active.read().clone();
        active.execute(work)
    }
}

impl std::fmt::Debug for ExecutorFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorFacade")
            .field("overridden", &self.is_overridden())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, RejectReason};
    use crate::executor::{from_fn, ExecutorExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Arc<dyn Executor>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let exec: Arc<dyn Executor> = Arc::new(from_fn(move |work: Work| {
            h.fetch_add(1, Ordering::SeqCst);
            work();
            Ok(())
        }));
        (exec, hits)
    }

    #[test]
    fn test_default_forwards_to_fallback() {
        let (fallback, hits) = counting();
        let facade = ExecutorFacade::new(fallback);

        assert!(!facade.is_overridden());
        facade.spawn(|| {}).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_override_then_reset() {
        let (fallback, fallback_hits) = counting();
        let (other, other_hits) = counting();
        let facade = ExecutorFacade::new(fallback);

        facade.set_executor(other);
        assert!(facade.is_overridden());
        facade.spawn(|| {}).unwrap();
        assert_eq!(other_hits.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_hits.load(Ordering::SeqCst), 0);

        facade.reset_executor();
        assert!(!facade.is_overridden());
        facade.spawn(|| {}).unwrap();
        assert_eq!(other_hits.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_override_wins_and_reset_is_idempotent() {
        let (fallback, fallback_hits) = counting();
        let (first, first_hits) = counting();
        let (second, second_hits) = counting();
        let facade = ExecutorFacade::new(fallback);

        facade.set_executor(first);
        facade.set_executor(second);
        facade.spawn(|| {}).unwrap();
        assert_eq!(first_hits.load(Ordering::SeqCst), 0);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);

        facade.reset_executor();
        facade.reset_executor();
        facade.spawn(|| {}).unwrap();
        assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejection_propagates_without_fallback() {
        let (fallback, fallback_hits) = counting();
        let rejecting: Arc<dyn Executor> = Arc::new(from_fn(|_work: Work| {
            Err(Error::rejected("Full", RejectReason::Saturated))
        }));
        let facade = ExecutorFacade::new(fallback);
        facade.set_executor(rejecting);

        let err = facade.spawn(|| {}).unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::Saturated));
        assert_eq!(fallback_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_facades_nest() {
        let (fallback, hits) = counting();
        let inner = Arc::new(ExecutorFacade::new(fallback));
        let outer = ExecutorFacade::new(inner);

        outer.spawn(|| {}).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
