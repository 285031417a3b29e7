//! Cold, cancellable tasks.
//!
//! A [`Task`] is an inert description of a computation `Fn(Resolver<T>)`.
//! Nothing happens until [`Task::run`], which:
//!
//! 1. allocates a fresh settlement cell,
//! 2. binds a [`Resolver`] to it (installing the hook bookkeeping listener),
//! 3. wraps the cell in an [`Execution`],
//! 4. invokes the computation synchronously with the resolver,
//! 5. returns the execution.
//!
//! The computation may settle before `run` returns or keep a clone of the
//! resolver and settle later from a callback. A task holds no state of its
//! own and may be run any number of times; every run is independent.
//!
//! # Example
//!
//! ```
//! use oxide::{Settlement, Task};
//!
//! let doubled = Task::of(21).map(|v| v * 2);
//! let execution = doubled.run();
//! assert_eq!(execution.settlement(), Some(Settlement::Resolved(42)));
//! ```

mod resolver;

pub use resolver::Resolver;

use core::fmt;
use std::rc::Rc;

use crate::deferred::Deferred;
use crate::execution::Execution;
use crate::types::Reason;

/// The body of a task.
pub type Computation<T> = dyn Fn(Resolver<T>);

/// An inert, re-runnable description of a cancellable computation.
pub struct Task<T> {
    computation: Rc<Computation<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            computation: Rc::clone(&self.computation),
        }
    }
}

impl<T: 'static> Task<T> {
    /// Creates a task from a computation.
    #[must_use]
    pub fn new<F>(computation: F) -> Self
    where
        F: Fn(Resolver<T>) + 'static,
    {
        Self {
            computation: Rc::new(computation),
        }
    }

    /// A task that resolves immediately with `value`.
    #[must_use]
    pub fn of(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(move |resolver| resolver.resolve(value.clone()))
    }

    /// A task that rejects immediately with `reason`.
    #[must_use]
    pub fn rejected(reason: impl Into<Reason>) -> Self {
        let reason = reason.into();
        Self::new(move |resolver| resolver.reject(reason.clone()))
    }

    /// A task that cancels itself immediately.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(|resolver| resolver.cancel())
    }

    /// Starts the computation and returns its execution.
    pub fn run(&self) -> Execution<T> {
        let deferred = Deferred::new();
        let resolver = Resolver::attach(deferred.clone());
        let execution = Execution::new(self.clone(), deferred);
        tracing::trace!(execution = %execution.id(), "running task");
        (self.computation)(resolver);
        execution
    }
}

/// Creates a task from a computation.
pub fn task<T, F>(computation: F) -> Task<T>
where
    T: 'static,
    F: Fn(Resolver<T>) + 'static,
{
    Task::new(computation)
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}
