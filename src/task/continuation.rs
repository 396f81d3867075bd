//! Continuation tasks: deferred work units chained on a worker pool.

use crate::cancel::CancellationToken;
use crate::error::Error;
use crate::pool::worker::panic_message;
use crate::pool::ThreadPool;
use crate::task::completion::Completion;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::trace;

type Method = Box<dyn FnOnce() + Send + 'static>;

/// Links mutated by `continue_with` on caller threads and by the worker
/// completing the task. One lock makes the ready-check-then-append atomic
/// against the final child drain, so a child can never be lost.
struct Links {
    method: Option<Method>,
    parent: Option<Arc<Inner>>,
    children: VecDeque<Arc<Inner>>,
}

struct Inner {
    pool: Arc<ThreadPool>,
    token: CancellationToken,
    completion: Completion,
    links: Mutex<Links>,
}

/// A deferred work unit with a completion handle and chainable successors.
///
/// A task is dispatched to its pool at construction and its successors are
/// dispatched when it completes. Children inherit the parent's cancellation
/// token; canceling the token fails every not-yet-dispatched task in the
/// subtree with [`Error::Canceled`] instead of running it.
///
/// Cloning shares the same underlying task. Dropping every handle to a
/// pending task does not cancel it; the pool and the parent keep it alive.
#[derive(Clone)]
pub struct ContinuationTask {
    inner: Arc<Inner>,
}

impl ContinuationTask {
    /// A root task whose completion is already fulfilled; nothing runs.
    ///
    /// Used to attach children to. Children inherit the never-canceled
    /// token.
    pub fn fulfilled(pool: Arc<ThreadPool>) -> Self {
        Self::fulfilled_with_token(pool, CancellationToken::never())
    }

    /// A fulfilled root whose children inherit `token`.
    pub fn fulfilled_with_token(pool: Arc<ThreadPool>, token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                pool,
                token,
                completion: Completion::fulfilled(),
                links: Mutex::new(Links {
                    method: None,
                    parent: None,
                    children: VecDeque::new(),
                }),
            }),
        }
    }

    /// Wrap `method` and immediately attempt to dispatch it on the pool.
    pub fn new<F>(pool: Arc<ThreadPool>, method: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::with_token(pool, method, CancellationToken::never())
    }

    /// Like [`ContinuationTask::new`] with an explicit cancellation token.
    ///
    /// When `token` is already canceled the task is never submitted and its
    /// completion fails with [`Error::Canceled`].
    pub fn with_token<F>(pool: Arc<ThreadPool>, method: F, token: CancellationToken) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let inner = Inner::pending(pool, token, Box::new(method), None);
        Inner::dispatch(inner.clone());

        Self { inner }
    }

    /// Wrap a work unit that polls its token for cooperative cancellation.
    ///
    /// The token is bound into the work unit; a cancel observed while the
    /// unit is running is the unit's to handle, the engine only skips tasks
    /// canceled before dispatch.
    pub fn cancelable<F>(pool: Arc<ThreadPool>, method: F, token: CancellationToken) -> Self
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let bound = token.clone();
        Self::with_token(pool, move || method(bound), token)
    }

    /// Append `method` to run on the pool after this task completes.
    ///
    /// Returns the new task; the child inherits this task's cancellation
    /// token. A child appended after completion is dispatched immediately.
    pub fn continue_with<F>(&self, method: F) -> ContinuationTask
    where
        F: FnOnce() + Send + 'static,
    {
        let child = Inner::pending(
            self.inner.pool.clone(),
            self.inner.token.clone(),
            Box::new(method),
            Some(self.inner.clone()),
        );

        {
            let mut links = self.inner.links.lock();
            if self.inner.completion.is_ready() {
                Inner::dispatch(child.clone());
            } else {
                links.children.push_back(child.clone());
            }
        }

        ContinuationTask { inner: child }
    }

    /// The completion handle.
    ///
    /// Polling and waiting may be concurrent; consuming the outcome is
    /// one-shot.
    pub fn future(&self) -> &Completion {
        &self.inner.completion
    }
}

impl Inner {
    fn pending(
        pool: Arc<ThreadPool>,
        token: CancellationToken,
        method: Method,
        parent: Option<Arc<Inner>>,
    ) -> Arc<Inner> {
        Arc::new(Inner {
            pool,
            token,
            completion: Completion::pending(),
            links: Mutex::new(Links {
                method: Some(method),
                parent,
                children: VecDeque::new(),
            }),
        })
    }

    /// Submit `task` to the pool, or fail it with the canceled error when
    /// its token is already set.
    ///
    /// A skipped task never reaches the pool, so its waiting children are
    /// failed here as well; otherwise they would stay pending forever.
    fn dispatch(task: Arc<Inner>) {
        let mut skipped = VecDeque::new();
        skipped.push_back(task);

        while let Some(task) = skipped.pop_front() {
            if !task.token.is_canceled() {
                let pool = task.pool.clone();
                pool.schedule(move || Inner::execute(task));
                continue;
            }

            trace!("task canceled before dispatch");
            task.completion.fail(Error::Canceled);

            let mut links = task.links.lock();
            links.method = None;
            links.parent = None;
            skipped.extend(links.children.drain(..));
        }
    }

    /// Worker-side execution of a dispatched task.
    fn execute(task: Arc<Inner>) {
        // Take the method out and release the parent first: ancestors are
        // no longer needed once this task runs, and the chain must not
        // retain them to arbitrary depth.
        let method = {
            let mut links = task.links.lock();
            links.parent = None;
            links.method.take()
        };

        let panic_payload = if task.token.is_canceled() {
            trace!("task canceled at dispatch");
            task.completion.fail(Error::Canceled);
            None
        } else {
            match method {
                Some(method) => match catch_unwind(AssertUnwindSafe(method)) {
                    Ok(()) => {
                        task.completion.fulfill();
                        None
                    }
                    Err(payload) => {
                        task.completion
                            .fail(Error::task_panic(panic_message(&*payload)));
                        Some(payload)
                    }
                },
                None => {
                    // A fulfilled root is never submitted; a missing method
                    // here means the task already transitioned.
                    task.completion.fulfill();
                    None
                }
            }
        };

        // The completion has transitioned; drain under the lock so a
        // concurrent continue_with cannot lose a child.
        {
            let mut links = task.links.lock();
            while let Some(child) = links.children.pop_front() {
                Inner::dispatch(child);
            }
        }

        // Re-raise so the pool's error list records the user panic as well.
        if let Some(payload) = panic_payload {
            resume_unwind(payload);
        }
    }
}

impl std::fmt::Debug for ContinuationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuationTask")
            .field("ready", &self.inner.completion.is_ready())
            .finish_non_exhaustive()
    }
}
