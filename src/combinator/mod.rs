//! Combinators over tasks.
//!
//! Every combinator builds a new [`Task`](crate::Task) whose computation runs
//! one or more sub-tasks, wires cancellation of the outer execution down to
//! them, and forwards their settlement into the outer resolver:
//!
//! - [`map`]: `map`, `try_map`, `and_then`, `or_else`
//! - [`join`]: `and` / `wait_all2`, `wait_all3`, `wait_all4`
//! - [`race`]: `or`, first settlement wins
//! - [`timeout`]: `or` against a lab timer that rejects
//!
//! # Failure Semantics
//!
//! Combinators are the recovery boundary. A rejection or captured panic in
//! a sub-task reaches the outer execution only through its rejection
//! channel, and cancelling the outer execution always reaches every running
//! sub-execution.
//!
//! # Algebraic Laws
//!
//! - Left identity: `of(x).and_then(f) ≃ f(x)`
//! - Right identity: `t.and_then(of) ≃ t`
//! - Associativity: `t.and_then(f).and_then(g) ≃ t.and_then(|v| f(v).and_then(g))`

pub mod join;
pub mod map;
pub mod race;
pub mod timeout;

use std::panic::{self, AssertUnwindSafe};

use crate::types::{PanicPayload, Reason};

/// Runs a transformation closure, turning a panic into a rejection reason.
pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> Result<R, Reason> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let payload = PanicPayload::from_panic(payload.as_ref());
        tracing::warn!(message = payload.message(), "transformation panicked; rejecting");
        Reason::Panicked(payload)
    })
}
