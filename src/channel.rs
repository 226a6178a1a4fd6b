//! Reader-facing bulk channel.
//!
//! # Overview
//! - One [`RingBuffer`] of [`EventBulkRecord`]s and a `released` flag, both under one mutex,
//!   plus a condition variable for blocked readers.
//! - Readers block only while the ring is empty and the channel is live. Every push and
//!   [`release`](BlockingEventChannel::release) notifies all waiters while holding the lock,
//!   and readers test the ring under that same lock before waiting, so no wakeup is lost.
//! - After `release` pushes are refused. Once the ring drains, every read reports
//!   [`ReadError::EndOfStream`].
//!
//! # Reader states
//! `Idle -> Waiting -> {Delivering | EndOfStream | TimedOut} -> Idle`. A timed-out read
//! leaves the ring untouched.

use std::sync::PoisonError;
use std::time::Instant;

use tracing::{debug, trace};

use crate::error::{Error, PushError, ReadError};
use crate::event::EventBulkRecord;
use crate::ring::RingBuffer;
use crate::sync::{Condvar, Mutex, MutexGuard};

/// Result of a single blocking read.
pub type ChannelResult = Result<EventBulkRecord, ReadError>;

/// Non-blocking view of what a read would do, as reported to poll/select callers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// At least one record is buffered.
    ReadReady,
    /// Released and drained; reads return end-of-stream.
    HangUp,
    /// Nothing buffered yet.
    Empty,
}

struct ChannelState {
    ring: RingBuffer<EventBulkRecord>,
    released: bool,
}

impl ChannelState {
    #[inline]
    fn readiness(&self) -> Readiness {
        if !self.ring.is_empty() {
            Readiness::ReadReady
        } else if self.released {
            Readiness::HangUp
        } else {
            Readiness::Empty
        }
    }
}

pub struct BlockingEventChannel {
    state: Mutex<ChannelState>,
    readable: Condvar,
}

impl BlockingEventChannel {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        let ring = RingBuffer::new(capacity)?;
        Ok(Self {
            state: Mutex::new(ChannelState {
                ring,
                released: false,
            }),
            readable: Condvar::new(),
        })
    }

    // The ring is consistent between operations, so a panicked holder leaves nothing torn.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a record and wake readers.
    pub fn push(&self, record: EventBulkRecord) -> Result<(), PushError<EventBulkRecord>> {
        let mut state = self.lock();
        if state.released {
            return Err(PushError::Released(record));
        }
        state.ring.push(record)?;
        trace!(sequence = record.sequence(), len = state.ring.len(), "bulk record queued");
        self.readable.notify_all();
        Ok(())
    }

    pub fn try_read_one(&self) -> Option<EventBulkRecord> {
        self.lock().ring.pop()
    }

    /// Block until a record is available, the channel is released and drained, or
    /// `deadline` passes.
    pub fn read_blocking(&self, deadline: Option<Instant>) -> ChannelResult {
        let mut state = self.lock();
        loop {
            if let Some(record) = state.ring.pop() {
                return Ok(record);
            }
            if state.released {
                return Err(ReadError::EndOfStream);
            }
            state = self.wait(state, deadline)?;
        }
    }

    /// Bulk read: block like [`read_blocking`](Self::read_blocking) until at least one record
    /// is available, then move up to `max` records into `out` in FIFO order under a single
    /// lock. Returns how many were moved; `max == 0` returns `Ok(0)` without waiting.
    pub fn read_into<E>(
        &self,
        out: &mut E,
        max: usize,
        deadline: Option<Instant>,
    ) -> Result<usize, ReadError>
    where
        E: Extend<EventBulkRecord>,
    {
        if max == 0 {
            return Ok(0);
        }
        let mut state = self.wait_readable(deadline)?;
        let mut read = 0usize;
        out.extend(core::iter::from_fn(|| {
            if read == max {
                return None;
            }
            let record = state.ring.pop()?;
            read += 1;
            Some(record)
        }));
        Ok(read)
    }

    /// Mark the end of the stream and wake every reader. Idempotent.
    pub fn release(&self) {
        let mut state = self.lock();
        if !state.released {
            state.released = true;
            debug!(pending = state.ring.len(), "bulk channel released");
        }
        self.readable.notify_all();
    }

    pub fn poll_readiness(&self) -> Readiness {
        self.lock().readiness()
    }

    /// Block until readiness is no longer [`Readiness::Empty`] or `deadline` passes.
    pub fn wait_readiness(&self, deadline: Option<Instant>) -> Readiness {
        match self.wait_readable(deadline) {
            Ok(_) => Readiness::ReadReady,
            Err(ReadError::EndOfStream) => Readiness::HangUp,
            Err(ReadError::TimedOut) => Readiness::Empty,
        }
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lock().ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().ring.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.lock().ring.capacity()
    }

    #[inline]
    pub fn peak(&self) -> usize {
        self.lock().ring.peak()
    }

    fn wait_readable(
        &self,
        deadline: Option<Instant>,
    ) -> Result<MutexGuard<'_, ChannelState>, ReadError> {
        let mut state = self.lock();
        loop {
            match state.readiness() {
                Readiness::ReadReady => return Ok(state),
                Readiness::HangUp => return Err(ReadError::EndOfStream),
                Readiness::Empty => state = self.wait(state, deadline)?,
            }
        }
    }

    /// One wait on the condition variable. Callers re-check state afterwards, which also
    /// covers spurious wakeups.
    fn wait<'a>(
        &self,
        state: MutexGuard<'a, ChannelState>,
        deadline: Option<Instant>,
    ) -> Result<MutexGuard<'a, ChannelState>, ReadError> {
        let Some(deadline) = deadline else {
            return Ok(self
                .readable
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner));
        };
        let now = Instant::now();
        if now >= deadline {
            return Err(ReadError::TimedOut);
        }
        let (state, _) = self
            .readable
            .wait_timeout(state, deadline - now)
            .unwrap_or_else(PoisonError::into_inner);
        Ok(state)
    }
}
