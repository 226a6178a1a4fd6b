//! Interrupt-side capture stage.
//!
//! # Overview
//! - [`CaptureStage`] owns the capture ring behind a spinlock. The lock is held only for
//!   one sequence increment plus one ring push or pop.
//! - [`InterruptProducer`] is the entry point the interrupt binding calls. It never sleeps
//!   and never allocates: it records the event, then asks its [`Schedule`] for a deferred run.
//! - Sequence numbers are handed out inside the lock, so ring order and sequence order agree.
//!   A sequence is consumed even when the ring is full and the event is dropped.

use alloc::sync::Arc;

use tracing::{trace, warn};

use crate::error::{Error, InvalidSource};
use crate::event::{CaptureEvent, SourceId};
use crate::ring::RingBuffer;
use crate::schedule::Schedule;
use crate::sync::{AtomicU64, Ordering, Spinlock};

/// Outcome of one interrupt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Capture {
    /// Buffered; a deferred run has been requested.
    Queued { sequence: u64 },
    /// The capture ring was full. The sequence number is burned.
    Dropped { sequence: u64 },
}

impl Capture {
    #[inline]
    pub fn sequence(self) -> u64 {
        match self {
            Capture::Queued { sequence } | Capture::Dropped { sequence } => sequence,
        }
    }

    #[inline]
    pub fn is_queued(self) -> bool {
        matches!(self, Capture::Queued { .. })
    }
}

struct CaptureRing {
    ring: RingBuffer<CaptureEvent>,
    last_sequence: u64,
}

pub struct CaptureStage {
    state: Spinlock<CaptureRing>,
    captured: AtomicU64,
    dropped: AtomicU64,
    rejected: AtomicU64,
}

impl CaptureStage {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        let ring = RingBuffer::new(capacity)?;
        Ok(Self {
            state: Spinlock::new(CaptureRing {
                ring,
                last_sequence: 0,
            }),
            captured: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        })
    }

    /// Take the next sequence and try to buffer the event.
    /// `Ok` carries the queued sequence, `Err` the dropped one.
    fn record(&self, source: SourceId) -> Result<u64, u64> {
        let mut state = self.state.lock();
        let sequence = state.last_sequence.wrapping_add(1);
        state.last_sequence = sequence;
        let pushed = state.ring.push(CaptureEvent::new(source, sequence));
        drop(state);

        match pushed {
            Ok(()) => {
                self.captured.fetch_add(1, Ordering::Relaxed);
                Ok(sequence)
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(sequence)
            }
        }
    }

    /// Remove the oldest buffered event. Used by the deferred stage.
    #[inline]
    pub fn pop(&self) -> Option<CaptureEvent> {
        self.state.lock().ring.pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.state.lock().ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state.lock().ring.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.state.lock().ring.capacity()
    }

    #[inline]
    pub fn peak(&self) -> usize {
        self.state.lock().ring.peak()
    }

    /// Events buffered since construction.
    #[inline]
    pub fn captured(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }

    /// Events lost to a full capture ring.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Raw source ids that failed validation.
    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

pub struct InterruptProducer<S> {
    stage: Arc<CaptureStage>,
    scheduler: S,
}

impl<S: Schedule> InterruptProducer<S> {
    pub fn new(stage: Arc<CaptureStage>, scheduler: S) -> Self {
        Self { stage, scheduler }
    }

    /// Record one qualifying transition of `source`. The caller has already debounced it.
    pub fn on_event(&self, source: SourceId) -> Capture {
        match self.stage.record(source) {
            Ok(sequence) => {
                trace!(sequence, source = ?source, "captured event");
                self.scheduler.schedule();
                Capture::Queued { sequence }
            }
            Err(sequence) => {
                warn!(sequence, source = ?source, "capture ring full, dropping event");
                Capture::Dropped { sequence }
            }
        }
    }

    /// Validate a raw source id before recording it. Rejected ids consume no sequence.
    pub fn on_raw_event(&self, raw: u32) -> Result<Capture, InvalidSource> {
        match SourceId::try_from(raw) {
            Ok(source) => Ok(self.on_event(source)),
            Err(err) => {
                self.stage.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(raw, "rejecting event from unknown source");
                Err(err)
            }
        }
    }

    #[inline]
    pub fn stage(&self) -> &Arc<CaptureStage> {
        &self.stage
    }

    #[inline]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    #[inline]
    pub fn captured(&self) -> u64 {
        self.stage.captured()
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.stage.dropped()
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.stage.rejected()
    }

    /// Events waiting for the deferred stage.
    #[inline]
    pub fn pending(&self) -> usize {
        self.stage.len()
    }
}
