//! The hand-off from interrupt context to deferred context.

use alloc::sync::Arc;

use crate::sync::{AtomicBool, Ordering};

/// Requests a later run of the deferred stage.
///
/// Called from interrupt context after every successful capture, so implementations must
/// not block and must not allocate. Requests may coalesce: one run after several calls is
/// enough, because the deferred stage drains everything that is queued.
pub trait Schedule: Send + Sync {
    fn schedule(&self);
}

impl<S: Schedule + ?Sized> Schedule for &S {
    #[inline]
    fn schedule(&self) {
        (**self).schedule()
    }
}

impl<S: Schedule + ?Sized> Schedule for Arc<S> {
    #[inline]
    fn schedule(&self) {
        (**self).schedule()
    }
}

/// A coalescing "work pending" flag, for hosts that drive the deferred stage themselves.
pub struct PendingWork {
    pending: AtomicBool,
}

impl PendingWork {
    pub fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Clear the flag, returning whether a run was requested.
    #[inline]
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for PendingWork {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedule for PendingWork {
    #[inline]
    fn schedule(&self) {
        self.pending.store(true, Ordering::Release);
    }
}
