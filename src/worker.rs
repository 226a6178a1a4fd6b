//! A dedicated thread standing in for the kernel work queue.
//!
//! [`WorkerScheduler::schedule`] sets a pending flag and unparks the thread, neither of which
//! blocks or allocates, so it is safe to call from interrupt context. The thread clears the
//! flag before each run, so requests that arrive during a run trigger one more run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle, Thread};

use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::expander::EventExpander;
use crate::schedule::Schedule;

#[derive(Default)]
struct WorkerShared {
    pending: AtomicBool,
    stop: AtomicBool,
}

/// Handle the interrupt side uses to request a deferred run.
#[derive(Clone)]
pub struct WorkerScheduler {
    shared: Arc<WorkerShared>,
    thread: Thread,
}

impl Schedule for WorkerScheduler {
    #[inline]
    fn schedule(&self) {
        if !self.shared.pending.swap(true, Ordering::AcqRel) {
            self.thread.unpark();
        }
    }
}

pub struct Worker {
    scheduler: WorkerScheduler,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(name: &str, expander: Arc<EventExpander>) -> Result<Self, Error> {
        let shared = Arc::new(WorkerShared::default());
        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || run_worker(&thread_shared, &expander))?;
        debug!(name, "deferred worker started");

        Ok(Self {
            scheduler: WorkerScheduler {
                shared,
                thread: handle.thread().clone(),
            },
            handle: Some(handle),
        })
    }

    pub fn scheduler(&self) -> WorkerScheduler {
        self.scheduler.clone()
    }

    /// Stop after one final drain of the capture ring, and join the thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.scheduler.shared.stop.store(true, Ordering::Release);
        self.scheduler.thread.unpark();
        if handle.join().is_err() {
            warn!("deferred worker panicked");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(shared: &WorkerShared, expander: &EventExpander) {
    loop {
        if shared.pending.swap(false, Ordering::AcqRel) {
            let stats = expander.run();
            trace!(drained = stats.drained, "deferred run");
            continue;
        }
        if shared.stop.load(Ordering::Acquire) {
            let stats = expander.run();
            debug!(drained = stats.drained, "deferred worker stopping");
            return;
        }
        thread::park();
    }
}
