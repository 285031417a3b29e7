//! Oxide: cold, cancellable tasks with a four-valued outcome.
//!
//! # Overview
//!
//! A [`Task`] is an inert description of a computation. Running it yields an
//! [`Execution`] backed by a one-shot settlement cell that ends in exactly
//! one of `Resolved`, `Rejected` or `Cancelled`. Cancellation is a first
//! class outcome, not an error: it is requested from outside, propagated
//! through every combinator, and observed cooperatively by the computation
//! through its [`Resolver`].
//!
//! # Core Guarantees
//!
//! - **One-shot settlement**: a cell settles once; resolving or rejecting a
//!   settled cell panics, cancelling it is a no-op
//! - **Cold tasks**: nothing runs until [`Task::run`]; every run is independent
//! - **Cancellation fan-out**: cancelling an execution cancels every linked
//!   child execution, depth first
//! - **Panic capture**: a panicking transformation rejects its task instead
//!   of unwinding through the caller
//! - **Deterministic testing**: the lab [`Scheduler`] drives timers in
//!   virtual time
//!
//! # Module Structure
//!
//! - [`types`]: Core types (settlements, reasons, identifiers)
//! - [`deferred`]: The single-threaded settlement cell
//! - [`execution`]: Running tasks and their cancellation links
//! - [`task`]: Tasks and resolvers
//! - [`combinator`]: map, and_then, or_else, join, race, timeout
//! - [`promise`]: Awaitable adapter
//! - [`lab`]: Virtual-time scheduler for testing
//! - [`writer`]: Value-with-log writer
//! - [`error`]: Error types
//!
//! # Threading
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); none of the types are
//! `Send`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod combinator;
pub mod deferred;
pub mod error;
pub mod execution;
pub mod lab;
pub mod promise;
pub mod task;
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;
pub mod types;
pub mod writer;

// Re-exports for convenient access to core types
pub use combinator::join::{wait_all2, wait_all3, wait_all4};
pub use deferred::Deferred;
pub use error::{ConfigError, HookKind, SchedulerError, TaskError, TimeoutError};
pub use execution::{Cancel, Execution};
pub use lab::{Scheduler, SchedulerConfig};
pub use promise::Promise;
pub use task::{task, Resolver, Task};
pub use types::{ExecutionId, PanicPayload, Reason, Settlement, SettlementState};
pub use writer::Writer;
