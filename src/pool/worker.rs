// worker thread loop
use super::job::Job;
use super::thread_pool::PoolShared;
use crate::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, trace};

pub(crate) type WorkerId = usize;

pub(crate) struct Worker {
    pub(crate) id: WorkerId,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self { id }
    }

    // main loop
    pub fn run(&self, shared: &PoolShared) {
        loop {
            let job = {
                let mut state = shared.state.lock();

                while state.queue.is_empty() && state.run {
                    shared.work_available.wait(&mut state);
                }

                // Shutdown wins over a non-empty queue; leftover items are
                // dropped by `stop`.
                if !state.run {
                    break;
                }

                state.queue.pop_front()
            };

            let Some(job) = job else { continue };
            self.execute(job, shared);
        }

        trace!(worker = self.id, "worker exiting");
    }

    fn execute(&self, job: Job, shared: &PoolShared) {
        let id = job.id;
        let queued_us = job.queued_at.elapsed().as_micros() as u64;
        trace!(worker = self.id, job = ?id, queued_us, "running job");

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| job.run())) {
            let message = panic_message(&*payload);
            error!(worker = self.id, job = ?id, %message, "job panicked");
            shared.errors.lock().push(Error::task_panic(message));
        }
    }
}

/// Best-effort extraction of a message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
