//! Sequential combinators: `map`, `try_map`, `and_then`, `or_else`.
//!
//! Each of these runs the source task when the combined task runs, then
//! reacts to the source's settlement:
//!
//! ```text
//! map(f):       Resolved(v) -> Resolved(f(v))
//! try_map(f):   Resolved(v) -> f(v) is Ok(u) ? Resolved(u) : Rejected(e)
//! and_then(f):  Resolved(v) -> run f(v), link it, forward its settlement
//! or_else(h):   Rejected(r) -> run h(r), link it, forward its settlement
//! ```
//!
//! Outcomes a combinator does not react to pass through unchanged. The
//! transformation closures run under panic capture; a panic becomes a
//! rejection of the combined task.
//!
//! The source execution is cancelled when the combined execution is
//! cancelled. Continuations started by `and_then` / `or_else` are linked to
//! the source execution, so the same cancellation reaches them.

use std::rc::Rc;

use super::capture;
use crate::execution::Execution;
use crate::task::{Resolver, Task};
use crate::types::{Reason, Settlement};

/// Runs `source` and cancels it when `resolver`'s execution is cancelled.
fn run_guarded<T: 'static, U: 'static>(source: &Task<T>, resolver: &Resolver<U>) -> Execution<T> {
    let execution = source.run();
    let inner = execution.clone();
    resolver.on_cancelled(move || {
        inner.cancel();
    });
    execution
}

/// Runs `next` as a continuation of `execution` and forwards its outcome.
fn continue_with<T: 'static, U: Clone + 'static>(
    execution: &Execution<T>,
    next: &Task<U>,
    resolver: Resolver<U>,
) {
    let continuation = next.run();
    continuation.listen(move |settled| resolver.forward(settled));
    execution.link(&continuation);
}

impl<T: Clone + 'static> Task<T> {
    /// Transforms the resolved value.
    ///
    /// A panic inside `f` rejects the combined task.
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Task<U>
    where
        U: 'static,
        F: Fn(T) -> U + 'static,
    {
        let source = self.clone();
        let f = Rc::new(f);
        Task::new(move |resolver: Resolver<U>| {
            let execution = run_guarded(&source, &resolver);
            let f = Rc::clone(&f);
            execution.listen(move |settled| match settled {
                Settlement::Resolved(value) => match capture(|| f(value.clone())) {
                    Ok(mapped) => resolver.resolve(mapped),
                    Err(reason) => resolver.reject(reason),
                },
                Settlement::Rejected(reason) => resolver.reject(reason.clone()),
                Settlement::Cancelled => resolver.cancel(),
            });
        })
    }

    /// Transforms the resolved value with a fallible function.
    ///
    /// `Err(e)` rejects the combined task with `e.into()`; a panic inside
    /// `f` rejects it with the captured panic.
    #[must_use]
    pub fn try_map<U, E, F>(&self, f: F) -> Task<U>
    where
        U: 'static,
        E: Into<Reason>,
        F: Fn(T) -> Result<U, E> + 'static,
    {
        let source = self.clone();
        let f = Rc::new(f);
        Task::new(move |resolver: Resolver<U>| {
            let execution = run_guarded(&source, &resolver);
            let f = Rc::clone(&f);
            execution.listen(move |settled| match settled {
                Settlement::Resolved(value) => match capture(|| f(value.clone())) {
                    Ok(Ok(mapped)) => resolver.resolve(mapped),
                    Ok(Err(error)) => resolver.reject(error),
                    Err(reason) => resolver.reject(reason),
                },
                Settlement::Rejected(reason) => resolver.reject(reason.clone()),
                Settlement::Cancelled => resolver.cancel(),
            });
        })
    }

    /// Chains a task produced from the resolved value.
    ///
    /// The continuation is linked to this task's execution, so cancelling
    /// the combined execution after the continuation started cancels the
    /// continuation as well.
    #[must_use]
    pub fn and_then<U, F>(&self, f: F) -> Task<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> Task<U> + 'static,
    {
        let source = self.clone();
        let f = Rc::new(f);
        Task::new(move |resolver: Resolver<U>| {
            let execution = run_guarded(&source, &resolver);
            let f = Rc::clone(&f);
            let source_execution = execution.clone();
            execution.listen(move |settled| match settled {
                Settlement::Resolved(value) => match capture(|| f(value.clone())) {
                    Ok(next) => continue_with(&source_execution, &next, resolver),
                    Err(reason) => resolver.reject(reason),
                },
                Settlement::Rejected(reason) => resolver.reject(reason.clone()),
                Settlement::Cancelled => resolver.cancel(),
            });
        })
    }

    /// Recovers from a rejection with a task produced from the reason.
    ///
    /// Resolution and cancellation pass through untouched.
    #[must_use]
    pub fn or_else<F>(&self, handler: F) -> Task<T>
    where
        F: Fn(Reason) -> Task<T> + 'static,
    {
        let source = self.clone();
        let handler = Rc::new(handler);
        Task::new(move |resolver: Resolver<T>| {
            let execution = run_guarded(&source, &resolver);
            let handler = Rc::clone(&handler);
            let source_execution = execution.clone();
            execution.listen(move |settled| match settled {
                Settlement::Resolved(value) => resolver.resolve(value.clone()),
                Settlement::Rejected(reason) => match capture(|| handler(reason.clone())) {
                    Ok(next) => continue_with(&source_execution, &next, resolver),
                    Err(panic) => resolver.reject(panic),
                },
                Settlement::Cancelled => resolver.cancel(),
            });
        })
    }
}
