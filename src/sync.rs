//! Synchronization primitives, swapped for `loom` models under the `loom` feature.

#[cfg(all(not(feature = "loom"), not(feature = "portable-atomic")))]
pub(crate) use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[cfg(all(not(feature = "loom"), feature = "portable-atomic"))]
pub(crate) use portable_atomic::{AtomicBool, AtomicU64, Ordering};

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[cfg(all(feature = "std", not(feature = "loom")))]
pub(crate) use std::sync::{Condvar, Mutex, MutexGuard};

#[cfg(feature = "loom")]
pub(crate) use loom::sync::{Condvar, Mutex, MutexGuard};

#[cfg(not(feature = "loom"))]
pub(crate) use spinning_top::Spinlock;

/// Stand-in for `spinning_top::Spinlock` that loom can explore.
#[cfg(feature = "loom")]
pub(crate) struct Spinlock<T> {
    inner: loom::sync::Mutex<T>,
}

#[cfg(feature = "loom")]
impl<T> Spinlock<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: loom::sync::Mutex::new(value),
        }
    }

    pub(crate) fn lock(&self) -> loom::sync::MutexGuard<'_, T> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
