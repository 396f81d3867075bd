//! The fixed-size worker pool.

use super::job::Job;
use super::worker::Worker;
use crate::config::PoolConfig;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Queue and run flag live under one lock so a dequeue decision and the
/// shutdown signal cannot interleave.
pub(crate) struct PoolState {
    pub(crate) queue: VecDeque<Job>,
    pub(crate) run: bool,
}

pub(crate) struct PoolShared {
    pub(crate) state: Mutex<PoolState>,
    pub(crate) work_available: Condvar,
    pub(crate) errors: Mutex<Vec<Error>>,
}

/// A fixed set of worker threads consuming a shared FIFO of work units.
///
/// The pool has a constructed/started/stopped lifecycle. Work may be
/// scheduled in any state; items queued while stopped run on the next
/// [`ThreadPool::start`]. Panics raised by work units are captured into an
/// error list retrievable with [`ThreadPool::pop_errors`] and never take a
/// worker down.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    config: PoolConfig,
}

impl ThreadPool {
    /// Create a stopped pool that will run `num_threads` workers.
    pub fn new(num_threads: usize) -> Self {
        let config = PoolConfig {
            num_threads: Some(num_threads),
            ..PoolConfig::default()
        };

        Self::build(config)
    }

    /// Create a stopped pool from a validated configuration.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PoolConfig) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    run: false,
                }),
                work_available: Condvar::new(),
                errors: Mutex::new(Vec::new()),
            }),
            workers: Mutex::new(Vec::new()),
            config,
        }
    }

    /// The configured worker thread count.
    pub fn num_threads(&self) -> usize {
        self.config.worker_threads()
    }

    /// Start the workers.
    ///
    /// A second call while running is a no-op. Spawns exactly the configured
    /// number of threads on the first successful call after construction or
    /// after [`ThreadPool::stop`]. On a partial spawn failure the
    /// already-spawned threads are stopped and the whole call fails.
    pub fn start(&self) -> Result<()> {
        let mut workers = self.workers.lock();
        if !workers.is_empty() {
            return Ok(());
        }

        self.shared.state.lock().run = true;

        let count = self.config.worker_threads();
        for id in 0..count {
            let worker = Worker::new(id);
            let shared = self.shared.clone();
            let name = format!("{}-{}", self.config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);
            if let Some(stack_size) = self.config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            match builder.spawn(move || worker.run(&shared)) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    self.shutdown_workers(&mut workers);
                    return Err(Error::executor(format!("spawn failed: {}", e)));
                }
            }
        }

        info!(threads = count, "pool started");
        Ok(())
    }

    /// Enqueue a nullary work unit.
    ///
    /// Legal before [`ThreadPool::start`], while running and after
    /// [`ThreadPool::stop`]; items queued while stopped accumulate for the
    /// next run.
    pub fn schedule<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let job = Job::new(f);
        trace!(job = ?job.id, "scheduling job");

        let mut state = self.shared.state.lock();
        state.queue.push_back(job);
        self.shared.work_available.notify_one();
    }

    /// Signal termination, wake idle workers and join every worker thread.
    ///
    /// Items currently executing run to completion; items still queued are
    /// discarded.
    pub fn stop(&self) {
        let mut workers = self.workers.lock();
        self.shutdown_workers(&mut workers);
    }

    /// Return and empty the list of errors captured from work units.
    pub fn pop_errors(&self) -> Vec<Error> {
        std::mem::take(&mut *self.shared.errors.lock())
    }

    fn shutdown_workers(&self, workers: &mut Vec<JoinHandle<()>>) {
        {
            let mut state = self.shared.state.lock();
            state.run = false;
            self.shared.work_available.notify_all();
        }

        let joined = workers.len();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }

        let dropped = {
            let mut state = self.shared.state.lock();
            let dropped = state.queue.len();
            state.queue.clear();
            dropped
        };

        if joined > 0 {
            info!(joined, dropped, "pool stopped");
        } else if dropped > 0 {
            debug!(dropped, "discarded queued jobs");
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();

        let unpopped = self.shared.errors.lock().len();
        if unpopped > 0 {
            warn!(unpopped, "pool dropped with unpopped errors");
            // Skipped while unwinding: a second panic would abort.
            if !thread::panicking() {
                debug_assert!(false, "pool dropped with {} unpopped errors", unpopped);
            }
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("threads", &self.config.worker_threads())
            .field("running", &!self.workers.lock().is_empty())
            .finish_non_exhaustive()
    }
}
