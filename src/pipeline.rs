//! One owned pipeline instance: capture stage, expander, bulk channel and, optionally, the
//! worker thread that runs the expander.
//!
//! The device glue keeps a [`Pipeline`] and threads it through its callbacks: the interrupt
//! binding calls [`producer`](Pipeline::producer), readers clone the
//! [`channel`](Pipeline::channel) into their own threads.

use std::sync::Arc;

use tracing::debug;

use crate::capture::{CaptureStage, InterruptProducer};
use crate::channel::BlockingEventChannel;
use crate::config::Config;
use crate::error::Error;
use crate::expander::{EventExpander, RunStats};
use crate::schedule::{PendingWork, Schedule};
use crate::worker::{Worker, WorkerScheduler};

/// Counter snapshot across all stages.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub captured: u64,
    pub capture_dropped: u64,
    pub rejected: u64,
    pub expanded: u64,
    pub bulk_dropped: u64,
    pub discarded: u64,
    pub capture_pending: usize,
    pub bulk_pending: usize,
    pub capture_peak: usize,
    pub bulk_peak: usize,
}

pub struct Pipeline<S: Schedule> {
    producer: InterruptProducer<S>,
    expander: Arc<EventExpander>,
    channel: Arc<BlockingEventChannel>,
    worker: Option<Worker>,
}

impl Pipeline<Arc<PendingWork>> {
    /// Build both rings. Deferred runs are only flagged; drive them with
    /// [`run_pending`](Self::run_pending).
    pub fn new(capture_capacity: usize, bulk_capacity: usize) -> Result<Self, Error> {
        let config = Config::new()
            .with_capture_capacity(capture_capacity)
            .with_bulk_capacity(bulk_capacity);
        Self::with_scheduler(&config, |_| Arc::new(PendingWork::new()))
    }

    /// Run the expander if a run was requested since the last call.
    pub fn run_pending(&self) -> Option<RunStats> {
        self.producer
            .scheduler()
            .take()
            .then(|| self.expander.run())
    }
}

impl Pipeline<WorkerScheduler> {
    /// Build both rings and start a worker thread that runs the expander on demand.
    pub fn spawn(config: &Config) -> Result<Self, Error> {
        let (capture, expander, channel) = build_stages(config)?;
        let worker = Worker::spawn(config.worker_name(), Arc::clone(&expander))?;
        Ok(Self {
            producer: InterruptProducer::new(capture, worker.scheduler()),
            expander,
            channel,
            worker: Some(worker),
        })
    }
}

impl<S: Schedule> Pipeline<S> {
    /// Build both rings around a caller-provided deferred-execution facility. `make` gets the
    /// expander its scheduler must eventually run.
    pub fn with_scheduler(
        config: &Config,
        make: impl FnOnce(&Arc<EventExpander>) -> S,
    ) -> Result<Self, Error> {
        let (capture, expander, channel) = build_stages(config)?;
        let scheduler = make(&expander);
        Ok(Self {
            producer: InterruptProducer::new(capture, scheduler),
            expander,
            channel,
            worker: None,
        })
    }

    #[inline]
    pub fn producer(&self) -> &InterruptProducer<S> {
        &self.producer
    }

    #[inline]
    pub fn expander(&self) -> &Arc<EventExpander> {
        &self.expander
    }

    #[inline]
    pub fn channel(&self) -> &Arc<BlockingEventChannel> {
        &self.channel
    }

    pub fn stats(&self) -> PipelineStats {
        let capture = self.producer.stage();
        PipelineStats {
            captured: capture.captured(),
            capture_dropped: capture.dropped(),
            rejected: capture.rejected(),
            expanded: self.expander.expanded(),
            bulk_dropped: self.expander.bulk_dropped(),
            discarded: self.expander.discarded(),
            capture_pending: capture.len(),
            bulk_pending: self.channel.len(),
            capture_peak: capture.peak(),
            bulk_peak: self.channel.peak(),
        }
    }

    /// Release the channel, stop the worker if there is one, and drop the rings. Readers
    /// still holding the channel drain what is left and then see end-of-stream.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.channel.release();
        if let Some(worker) = self.worker.take() {
            worker.stop();
            debug!(stats = ?self.stats(), "pipeline shut down");
        }
    }
}

impl<S: Schedule> Drop for Pipeline<S> {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_stages(
    config: &Config,
) -> Result<(Arc<CaptureStage>, Arc<EventExpander>, Arc<BlockingEventChannel>), Error> {
    config.validate()?;
    let capture = Arc::new(CaptureStage::new(config.capture_capacity())?);
    let channel = Arc::new(BlockingEventChannel::new(config.bulk_capacity())?);
    let expander = Arc::new(EventExpander::new(
        Arc::clone(&capture),
        Arc::clone(&channel),
    ));
    debug!(
        capture_capacity = config.capture_capacity(),
        bulk_capacity = config.bulk_capacity(),
        "pipeline stages built"
    );
    Ok((capture, expander, channel))
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::{Pipeline, PipelineStats};
    use crate::config::Config;
    use crate::error::{Error, ReadError};
    use crate::event::SourceId;
    use crate::schedule::PendingWork;
    use std::sync::Arc;

    #[test]
    fn new_rejects_bad_capacities() {
        assert!(matches!(
            Pipeline::new(6, 16),
            Err(Error::CapacityInvalid { capacity: 6 })
        ));
        assert!(matches!(
            Pipeline::new(8, 0),
            Err(Error::CapacityInvalid { capacity: 0 })
        ));
    }

    #[test]
    fn run_pending_only_runs_when_requested() {
        let pipeline = Pipeline::new(8, 16).unwrap();
        assert_eq!(pipeline.run_pending(), None);

        pipeline.producer().on_event(SourceId::Button5);
        let stats = pipeline.run_pending().unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(pipeline.run_pending(), None);
    }

    #[test]
    fn stats_cover_every_stage() {
        let pipeline = Pipeline::new(4, 2).unwrap();
        for _ in 0..4 {
            pipeline.producer().on_event(SourceId::RockerEast);
        }
        let _ = pipeline.producer().on_raw_event(42);
        let _ = pipeline.run_pending();

        assert_eq!(
            pipeline.stats(),
            PipelineStats {
                captured: 3,
                capture_dropped: 1,
                rejected: 1,
                expanded: 1,
                bulk_dropped: 2,
                discarded: 0,
                capture_pending: 0,
                bulk_pending: 1,
                capture_peak: 3,
                bulk_peak: 1,
            }
        );
    }

    #[test]
    fn custom_scheduler_sees_the_expander() {
        let config = Config::new().with_capture_capacity(16).with_bulk_capacity(16);
        let pipeline = Pipeline::with_scheduler(&config, |expander| {
            assert_eq!(expander.capture().capacity(), 16);
            PendingWork::new()
        })
        .unwrap();

        pipeline.producer().on_event(SourceId::Button6);
        assert!(pipeline.producer().scheduler().take());
        let _ = pipeline.expander().run();
        assert_eq!(pipeline.channel().len(), 1);
    }

    #[test]
    fn drop_releases_reader_handles() {
        let pipeline = Pipeline::new(8, 16).unwrap();
        pipeline.producer().on_event(SourceId::Button5);
        let _ = pipeline.run_pending();

        let channel = Arc::clone(pipeline.channel());
        drop(pipeline);

        assert_eq!(channel.read_blocking(None).unwrap().sequence(), 1);
        assert_eq!(channel.read_blocking(None), Err(ReadError::EndOfStream));
    }
}
