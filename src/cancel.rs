//! One-shot cooperative cancellation.
//!
//! A [`CancellationSource`] owns the cancel signal; any number of
//! [`CancellationToken`]s observe it. Cancellation is cooperative: running
//! work is never interrupted, it has to poll its token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Producer side of a one-shot boolean cancel signal.
///
/// The flag transitions `false -> true` at most once. Source and tokens
/// share ownership of the flag, so a token may outlive its source.
#[derive(Debug)]
pub struct CancellationSource {
    canceled: Arc<AtomicBool>,
}

impl CancellationSource {
    /// Create a source in the live (not canceled) state.
    pub fn new() -> Self {
        Self {
            canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the flag. Idempotent, never fails, safe from any thread.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// Whether this source has been canceled.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Issue a token observing this source. Callable any number of times,
    /// before or after [`CancellationSource::cancel`].
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            canceled: self.canceled.clone(),
        }
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer of a [`CancellationSource`]. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    canceled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Monotone read of the observed flag: once true, true thereafter.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// The shared never-canceled token, used when a caller supplies none.
    pub fn never() -> Self {
        static NEVER: OnceLock<Arc<AtomicBool>> = OnceLock::new();

        Self {
            canceled: NEVER.get_or_init(|| Arc::new(AtomicBool::new(false))).clone(),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::never()
    }
}
