//! Single-consumer completion handles.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

enum State {
    Pending,
    Ready(Result<()>),
    Consumed,
}

impl State {
    fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }
}

/// The future half of a task.
///
/// Pending until the task fulfills or fails it; the outcome is then
/// consumable exactly once via [`Completion::take`]. Polling and waiting may
/// happen from any number of threads concurrently.
pub struct Completion {
    state: Mutex<State>,
    ready: Condvar,
}

impl Completion {
    pub(crate) fn pending() -> Self {
        Self {
            state: Mutex::new(State::Pending),
            ready: Condvar::new(),
        }
    }

    pub(crate) fn fulfilled() -> Self {
        Self {
            state: Mutex::new(State::Ready(Ok(()))),
            ready: Condvar::new(),
        }
    }

    /// Zero-timeout poll.
    pub fn is_ready(&self) -> bool {
        !self.state.lock().is_pending()
    }

    /// Block until the task has fulfilled or failed this handle.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        while state.is_pending() {
            self.ready.wait(&mut state);
        }
    }

    /// Wait up to `timeout`; true when the handle became ready in time.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        let mut state = self.state.lock();
        while state.is_pending() {
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                return !state.is_pending();
            }
        }

        true
    }

    /// Block until ready and consume the outcome.
    ///
    /// Consumption is one-shot: a second call returns
    /// [`Error::OutcomeConsumed`] (debug builds assert).
    pub fn take(&self) -> Result<()> {
        let mut state = self.state.lock();
        while state.is_pending() {
            self.ready.wait(&mut state);
        }

        match std::mem::replace(&mut *state, State::Consumed) {
            State::Ready(outcome) => outcome,
            State::Consumed => {
                debug_assert!(false, "completion outcome consumed twice");
                Err(Error::OutcomeConsumed)
            }
            State::Pending => unreachable!("waited for readiness above"),
        }
    }

    // Producer side. A completion transitions from pending exactly once;
    // a second set is a no-op.
    pub(crate) fn fulfill(&self) {
        self.set(Ok(()));
    }

    pub(crate) fn fail(&self, err: Error) {
        self.set(Err(err));
    }

    fn set(&self, outcome: Result<()>) {
        let mut state = self.state.lock();
        if state.is_pending() {
            *state = State::Ready(outcome);
            self.ready.notify_all();
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("ready", &self.is_ready())
            .finish()
    }
}
