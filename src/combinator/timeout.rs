//! Timeout combinator: add a deadline to a task.
//!
//! A timeout is a race against a lab timer that rejects:
//!
//! ```text
//! task.timeout(&scheduler, d) ≃ task.or(&scheduler.delay_rejected(d, TimeoutError { after: d }))
//! ```
//!
//! Whichever side settles first wins and the other side is cancelled, so a
//! task that settles in time clears the pending timer, and a timed-out task
//! is cancelled.
//!
//! # Algebraic Law: Timeout Composition
//!
//! ```text
//! t.timeout(s, d2).timeout(s, d1) ≃ t.timeout(s, min(d1, d2))
//! ```
//!
//! up to the `after` duration carried by the rejection.

use std::time::Duration;

use crate::error::TimeoutError;
use crate::lab::Scheduler;
use crate::task::Task;
use crate::types::Reason;

impl<T: Clone + 'static> Task<T> {
    /// Rejects with a [`TimeoutError`] unless this task settles within
    /// `after` virtual time on `scheduler`.
    #[must_use]
    pub fn timeout(&self, scheduler: &Scheduler, after: Duration) -> Task<T> {
        let deadline = scheduler.delay_rejected(after, Reason::error(TimeoutError { after }));
        self.or(&deadline)
    }
}
