//! Worker pool infrastructure.
//!
//! A fixed set of threads consumes a single shared FIFO of type-erased
//! work units. Panics raised by work units are isolated and collected.

pub mod thread_pool;

pub(crate) mod job;
pub(crate) mod worker;

pub use thread_pool::ThreadPool;
