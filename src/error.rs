use thiserror::Error;

/// Construction and lifecycle failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("capacity must be a non-zero power of two, got {capacity}")]
    CapacityInvalid { capacity: usize },

    #[cfg(feature = "std")]
    #[error("failed to spawn deferred worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// A ring rejected a push because it already holds `capacity - 1` elements.
/// Carries the rejected element back to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ring buffer is full")]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError<T> {
    #[error("bulk ring is full")]
    Full(T),

    #[error("channel has been released")]
    Released(T),
}

impl<T> PushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(value) | PushError::Released(value) => value,
        }
    }
}

impl<T> From<Full<T>> for PushError<T> {
    fn from(full: Full<T>) -> Self {
        PushError::Full(full.0)
    }
}

/// Why a blocking read returned without a record.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    #[error("deadline elapsed before a record arrived")]
    TimedOut,

    #[error("channel released and drained")]
    EndOfStream,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown capture source {0}")]
pub struct InvalidSource(pub u32);
