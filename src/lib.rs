//! Interrupt-to-reader event capture for embedded drivers.
//!
//! # Highlights
//! - Three stages: interrupt producer, deferred expander, blocking reader.
//! - Bounded power-of-two rings on both sides; full rings drop and count, never overwrite.
//! - No allocation and no sleeping lock on the interrupt path.
//! - Readers block until a record arrives, a deadline passes, or the channel is released.
//!
//! # Quick start
//! ```
//! use ph_capture::{Pipeline, ReadError, SourceId};
//!
//! let pipeline = Pipeline::new(8, 16)?;
//!
//! // interrupt context
//! pipeline.producer().on_event(SourceId::Button5);
//!
//! // deferred context
//! let stats = pipeline.run_pending().unwrap_or_default();
//! assert_eq!(stats.delivered, 1);
//!
//! // reader context
//! let record = pipeline.channel().read_blocking(None)?;
//! assert_eq!(record.sequence(), 1);
//! assert_eq!(record.payload()[3], 4);
//!
//! pipeline.channel().release();
//! assert_eq!(pipeline.channel().read_blocking(None), Err(ReadError::EndOfStream));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # No-std
//! With `default-features = false` the crate is `#![no_std]` + `alloc` and exposes the
//! interrupt-facing half: [`RingBuffer`], [`CaptureStage`], [`InterruptProducer`] and the
//! [`Schedule`] seam. The `std` feature (default) adds the blocking channel, the expander,
//! the worker thread and [`Pipeline`].
//!
//! # Concurrency
//! - The capture ring is guarded by a spinlock held for O(1) work; one producer, one drainer.
//! - The bulk ring is guarded by a mutex and a condition variable; one drainer, any number
//!   of readers. Push-then-notify and check-then-wait happen under the same lock.
//! - [`EventExpander::run`] calls are serialized, so sequences reach readers in order.
//!
//! # Semantics
//! - Sequence numbers are `u64`, start at 1 and are consumed even when the capture ring
//!   drops the event, so gaps at the reader show drops.
//! - A ring of capacity `N` holds at most `N - 1` elements.
//! - Once released and drained the channel reports [`ReadError::EndOfStream`] for good.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod capture;
#[cfg(feature = "std")]
pub mod channel;
pub mod config;
pub mod error;
pub mod event;
#[cfg(feature = "std")]
pub mod expander;
#[cfg(feature = "std")]
pub mod pipeline;
pub mod ring;
pub mod schedule;
pub(crate) mod sync;
#[cfg(feature = "std")]
pub mod worker;

#[cfg(all(test, feature = "loom"))]
mod loom_models;

pub use capture::{Capture, CaptureStage, InterruptProducer};
#[cfg(feature = "std")]
pub use channel::{BlockingEventChannel, ChannelResult, Readiness};
pub use config::Config;
pub use error::{Error, Full, InvalidSource, PushError, ReadError};
pub use event::{CaptureEvent, EventBulkRecord, PAYLOAD_LEN, RECORD_SIZE, SourceId, records_in};
#[cfg(feature = "std")]
pub use expander::{EventExpander, RunStats};
#[cfg(feature = "std")]
pub use pipeline::{Pipeline, PipelineStats};
pub use ring::RingBuffer;
pub use schedule::{PendingWork, Schedule};
#[cfg(feature = "std")]
pub use worker::{Worker, WorkerScheduler};

#[cfg(all(test, not(feature = "std")))]
extern crate std;
