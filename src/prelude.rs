//! Convenient re-exports for common strand types.
//!
//! This module provides a single import for most use cases:
//! ```
//! use strand::prelude::*;
//! ```

pub use crate::cancel::{CancellationSource, CancellationToken};
pub use crate::config::{ConfigBuilder, PoolConfig};
pub use crate::error::{Error, Result};
pub use crate::pool::ThreadPool;
pub use crate::task::{Completion, ContinuationTask};
