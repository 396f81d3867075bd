//! Type-erased work units for the pool queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global job ID counter
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct JobId(u64);

impl JobId {
    fn next() -> Self {
        JobId(JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A nullary work unit queued on the pool.
///
/// The closure is moved in once and consumed by [`Job::run`]; a second
/// invocation is impossible by construction.
pub(crate) struct Job {
    pub(crate) id: JobId,
    func: Box<dyn FnOnce() + Send + 'static>,
    pub(crate) queued_at: Instant,
}

impl Job {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Job {
            id: JobId::next(),
            func: Box::new(f),
            queued_at: Instant::now(),
        }
    }

    /// Invoke the work unit.
    pub fn run(self) {
        (self.func)();
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("queued_at", &self.queued_at)
            .finish()
    }
}
