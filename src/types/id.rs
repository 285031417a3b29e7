//! Identifier types for executions.
//!
//! Every call to `Task::run` produces an execution with a process-unique id.
//! Ids carry no ownership; they exist so that logs can correlate a
//! cancellation cascade with the executions it touched.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EXECUTION_ID: AtomicU64 = AtomicU64::new(1);

/// A unique identifier for one execution of a task.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionId(u64);

impl ExecutionId {
    /// Allocates the next execution id.
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_EXECUTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an execution id for testing purposes.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExecutionId({})", self.0)
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}
