//! Strand - continuation tasks on a fixed worker pool
//!
//! A small embeddable task engine. A fixed set of worker threads consumes a
//! shared FIFO of opaque work units, and a continuation layer chains units
//! so that a successor starts only after its predecessor completes, with
//! cooperative cancellation propagating down the chain.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use strand::{ContinuationTask, ThreadPool};
//!
//! let pool = Arc::new(ThreadPool::new(2));
//! pool.start().unwrap();
//!
//! let task = ContinuationTask::new(pool.clone(), || println!("first"));
//! let last = task.continue_with(|| println!("second"));
//!
//! last.future().wait();
//! pool.stop();
//! ```
//!
//! # Features
//!
//! - **Worker pool**: fixed thread count, single global FIFO, clean
//!   start/stop lifecycle, panic isolation with an error list
//! - **Continuation tasks**: future-like completion handles, `continue_with`
//!   chaining, at-most-once execution
//! - **Cancellation**: one-shot broadcast source/token pair, observed
//!   cooperatively; canceled subtrees complete with a well-known error

#![warn(missing_docs, missing_debug_implementations)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod task;

pub use cancel::{CancellationSource, CancellationToken};
pub use config::{ConfigBuilder, PoolConfig};
pub use error::{Error, Result};
pub use pool::ThreadPool;
pub use task::{Completion, ContinuationTask};
