use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot gate in front of a session's teardown.
///
/// Every trigger calls [`try_acquire`](Self::try_acquire); exactly one of them
/// ever sees `true` and does the work.
#[derive(Debug, Default)]
pub struct LifecycleGuard {
    spent: AtomicBool,
}

impl LifecycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> bool {
        self.spent
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_spent(&self) -> bool {
        self.spent.load(Ordering::Acquire)
    }
}
