#[cfg(all(test, feature = "loom"))]
mod tests {
    use crate::capture::{CaptureStage, InterruptProducer};
    use crate::channel::BlockingEventChannel;
    use crate::error::ReadError;
    use crate::event::{CaptureEvent, EventBulkRecord, SourceId};
    use crate::expander::EventExpander;
    use crate::schedule::PendingWork;
    use loom::{model::Builder, thread};
    use std::sync::Arc;

    fn builder() -> Builder {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }
        builder
    }

    fn record(sequence: u64) -> EventBulkRecord {
        EventBulkRecord::expand(CaptureEvent::new(SourceId::Button5, sequence))
    }

    #[test]
    fn reader_never_misses_a_push() {
        builder().check(|| {
            let channel = Arc::new(BlockingEventChannel::new(4).unwrap());

            let pusher = {
                let channel = Arc::clone(&channel);
                thread::spawn(move || channel.push(record(1)).unwrap())
            };

            assert_eq!(channel.read_blocking(None), Ok(record(1)));
            pusher.join().unwrap();
        });
    }

    #[test]
    fn release_wakes_every_reader() {
        builder().check(|| {
            let channel = Arc::new(BlockingEventChannel::new(4).unwrap());

            let readers: Vec<_> = (0..2)
                .map(|_| {
                    let channel = Arc::clone(&channel);
                    thread::spawn(move || channel.read_blocking(None))
                })
                .collect();

            channel.release();
            channel.release();

            for reader in readers {
                assert_eq!(reader.join().unwrap(), Err(ReadError::EndOfStream));
            }
        });
    }

    #[test]
    fn release_racing_push_keeps_pending_records() {
        builder().check(|| {
            let channel = Arc::new(BlockingEventChannel::new(4).unwrap());

            let pusher = {
                let channel = Arc::clone(&channel);
                thread::spawn(move || channel.push(record(7)).is_ok())
            };
            let releaser = {
                let channel = Arc::clone(&channel);
                thread::spawn(move || channel.release())
            };

            let delivered = pusher.join().unwrap();
            releaser.join().unwrap();

            if delivered {
                assert_eq!(channel.read_blocking(None), Ok(record(7)));
            }
            assert_eq!(channel.read_blocking(None), Err(ReadError::EndOfStream));
            assert_eq!(channel.read_blocking(None), Err(ReadError::EndOfStream));
        });
    }

    #[test]
    fn drainer_sees_sequences_in_order() {
        builder().check(|| {
            let capture = Arc::new(CaptureStage::new(4).unwrap());
            let channel = Arc::new(BlockingEventChannel::new(4).unwrap());
            let expander = Arc::new(EventExpander::new(Arc::clone(&capture), Arc::clone(&channel)));
            let producer = InterruptProducer::new(Arc::clone(&capture), PendingWork::new());

            let interrupt = thread::spawn(move || {
                producer.on_event(SourceId::RockerNorth);
                producer.on_event(SourceId::RockerSouth);
            });

            let drainer = {
                let expander = Arc::clone(&expander);
                thread::spawn(move || {
                    let _ = expander.run();
                })
            };

            interrupt.join().unwrap();
            drainer.join().unwrap();
            let _ = expander.run();

            assert_eq!(channel.try_read_one().map(|r| r.sequence()), Some(1));
            assert_eq!(channel.try_read_one().map(|r| r.sequence()), Some(2));
            assert_eq!(channel.try_read_one(), None);
        });
    }
}
