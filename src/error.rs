//! Error types for the strand engine.

/// Result type alias for strand operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the worker pool and the continuation layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Worker threads could not be spawned
    #[error("executor error: {0}")]
    Executor(String),

    /// The task was skipped because its cancellation token was already set
    #[error("task canceled")]
    Canceled,

    /// A work unit panicked while executing
    #[error("task panicked: {0}")]
    TaskPanic(String),

    /// The completion outcome was already consumed
    #[error("task outcome already consumed")]
    OutcomeConsumed,
}

impl Error {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an executor error
    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    /// Create a task panic error
    pub fn task_panic<S: Into<String>>(msg: S) -> Self {
        Error::TaskPanic(msg.into())
    }

    /// True when this is the engine-injected cancellation error.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}
