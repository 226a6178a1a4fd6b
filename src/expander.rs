//! Deferred stage: drains the capture ring and feeds the bulk channel.

use std::sync::{Arc, PoisonError};

use tracing::{debug, trace, warn};

use crate::capture::CaptureStage;
use crate::channel::BlockingEventChannel;
use crate::error::PushError;
use crate::event::EventBulkRecord;
use crate::sync::{AtomicU64, Mutex, Ordering};

/// Counts from one [`EventExpander::run`].
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Capture events taken off the capture ring.
    pub drained: usize,
    /// Bulk records queued on the channel.
    pub delivered: usize,
    /// Bulk records lost to a full or released channel.
    pub dropped: usize,
}

pub struct EventExpander {
    capture: Arc<CaptureStage>,
    channel: Arc<BlockingEventChannel>,
    running: Mutex<()>,
    expanded: AtomicU64,
    bulk_dropped: AtomicU64,
    discarded: AtomicU64,
}

impl EventExpander {
    pub fn new(capture: Arc<CaptureStage>, channel: Arc<BlockingEventChannel>) -> Self {
        Self {
            capture,
            channel,
            running: Mutex::new(()),
            expanded: AtomicU64::new(0),
            bulk_dropped: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Drain every buffered capture event, expanding each into the bulk channel.
    ///
    /// May block, so it must not be called from interrupt context. Concurrent calls are
    /// serialized. A capture event is consumed even when its bulk record cannot be queued.
    pub fn run(&self) -> RunStats {
        let _running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stats = RunStats::default();

        while let Some(capture) = self.capture.pop() {
            stats.drained += 1;
            let record = EventBulkRecord::expand(capture);

            match self.channel.push(record) {
                Ok(()) => {
                    stats.delivered += 1;
                    self.expanded.fetch_add(1, Ordering::Relaxed);
                }
                Err(PushError::Full(record)) => {
                    stats.dropped += 1;
                    self.bulk_dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        sequence = record.sequence(),
                        source = ?record.source(),
                        "bulk ring full, dropping expanded record"
                    );
                }
                Err(PushError::Released(record)) => {
                    stats.dropped += 1;
                    self.discarded.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        sequence = record.sequence(),
                        "channel released, discarding expanded record"
                    );
                }
            }
        }

        trace!(
            drained = stats.drained,
            delivered = stats.delivered,
            dropped = stats.dropped,
            "expander run complete"
        );
        stats
    }

    #[inline]
    pub fn capture(&self) -> &Arc<CaptureStage> {
        &self.capture
    }

    #[inline]
    pub fn channel(&self) -> &Arc<BlockingEventChannel> {
        &self.channel
    }

    /// Bulk records queued since construction.
    #[inline]
    pub fn expanded(&self) -> u64 {
        self.expanded.load(Ordering::Relaxed)
    }

    /// Bulk records lost to a full bulk ring.
    #[inline]
    pub fn bulk_dropped(&self) -> u64 {
        self.bulk_dropped.load(Ordering::Relaxed)
    }

    /// Bulk records refused because the channel was already released.
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}
