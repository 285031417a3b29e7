//! The capability handed to a running computation.
//!
//! A [`Resolver`] settles the execution it belongs to and lets the
//! computation react to cancellation:
//!
//! - `resolve` / `reject` settle once; both are no-ops after the execution
//!   was cancelled, so a cancellation request always wins against a late
//!   settlement.
//! - `cancel` cancels the execution if it is still pending.
//! - `cleanup` hooks run once on any terminal settlement.
//! - `on_cancelled` hooks run only if the execution is cancelled.
//!
//! Cancellation is cooperative: a computation that holds a resource (a
//! timer, an I/O handle) must release it from an `on_cancelled` hook or by
//! polling [`Resolver::is_cancelled`].

use core::fmt;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use crate::deferred::Deferred;
use crate::error::{HookKind, TaskError};
use crate::types::{Reason, Settlement, SettlementState};

type Hook = Box<dyn FnOnce()>;

#[derive(Default)]
struct Hooks {
    settled: Option<SettlementState>,
    cleanups: Vec<Hook>,
    cancellations: Vec<Hook>,
}

/// Settles one execution and registers its lifecycle hooks.
///
/// Cloning a `Resolver` clones the handle; computations that settle
/// asynchronously keep a clone in their callbacks.
pub struct Resolver<T> {
    deferred: Deferred<T>,
    hooks: Rc<RefCell<Hooks>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
            hooks: Rc::clone(&self.hooks),
        }
    }
}

impl<T: 'static> Resolver<T> {
    /// Binds a resolver to a fresh cell and installs the bookkeeping
    /// listener that drives the hook lists.
    ///
    /// The bookkeeping listener is the first listener on the cell, so the
    /// hooks have run (and `is_cancelled` is set) before any other listener
    /// observes the settlement.
    pub(crate) fn attach(deferred: Deferred<T>) -> Self {
        let hooks = Rc::new(RefCell::new(Hooks::default()));
        let bookkeeping = Rc::clone(&hooks);
        deferred.listen(move |settled: &Settlement<T>| {
            let (cleanups, cancellations) = {
                let mut hooks = bookkeeping.borrow_mut();
                hooks.settled = Some(settled.state());
                (
                    mem::take(&mut hooks.cleanups),
                    mem::take(&mut hooks.cancellations),
                )
            };
            for cleanup in cleanups {
                cleanup();
            }
            match settled {
                Settlement::Cancelled => {
                    for hook in cancellations {
                        hook();
                    }
                }
                Settlement::Resolved(_) | Settlement::Rejected(_) => drop(cancellations),
            }
        });
        Self { deferred, hooks }
    }

    /// Resolves the execution unless it was cancelled.
    ///
    /// # Panics
    ///
    /// Panics if the execution already resolved or rejected.
    #[track_caller]
    pub fn resolve(&self, value: T) {
        if !self.is_cancelled() {
            self.deferred.resolve(value);
        }
    }

    /// Rejects the execution unless it was cancelled.
    ///
    /// # Panics
    ///
    /// Panics if the execution already resolved or rejected.
    #[track_caller]
    pub fn reject(&self, reason: impl Into<Reason>) {
        if !self.is_cancelled() {
            self.deferred.reject(reason);
        }
    }

    /// Cancels the execution if it is still pending.
    pub fn cancel(&self) {
        self.deferred.maybe_cancel();
    }

    /// Forwards another execution's outcome into this one.
    pub(crate) fn forward(&self, settled: &Settlement<T>)
    where
        T: Clone,
    {
        match settled {
            Settlement::Resolved(value) => self.resolve(value.clone()),
            Settlement::Rejected(reason) => self.reject(reason.clone()),
            Settlement::Cancelled => self.cancel(),
        }
    }

    /// Returns true once the execution has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.hooks.borrow().settled == Some(SettlementState::Cancelled)
    }

    /// Returns true once the execution reached any terminal state.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.hooks.borrow().settled.is_some()
    }

    /// Registers a hook that runs once when the execution settles.
    pub fn try_cleanup<F>(&self, hook: F) -> Result<(), TaskError>
    where
        F: FnOnce() + 'static,
    {
        self.register(HookKind::Cleanup, Box::new(hook))
    }

    /// Registers a hook that runs only if the execution is cancelled.
    pub fn try_on_cancelled<F>(&self, hook: F) -> Result<(), TaskError>
    where
        F: FnOnce() + 'static,
    {
        self.register(HookKind::Cancellation, Box::new(hook))
    }

    /// Registers a hook that runs once when the execution settles.
    ///
    /// # Panics
    ///
    /// Panics if the execution already settled.
    #[track_caller]
    pub fn cleanup<F>(&self, hook: F)
    where
        F: FnOnce() + 'static,
    {
        if let Err(err) = self.try_cleanup(hook) {
            panic!("{err}");
        }
    }

    /// Registers a hook that runs only if the execution is cancelled.
    ///
    /// # Panics
    ///
    /// Panics if the execution already settled.
    #[track_caller]
    pub fn on_cancelled<F>(&self, hook: F)
    where
        F: FnOnce() + 'static,
    {
        if let Err(err) = self.try_on_cancelled(hook) {
            panic!("{err}");
        }
    }

    fn register(&self, kind: HookKind, hook: Hook) -> Result<(), TaskError> {
        let mut hooks = self.hooks.borrow_mut();
        if let Some(state) = hooks.settled {
            return Err(TaskError::LateRegistration { hook: kind, state });
        }
        match kind {
            HookKind::Cleanup => hooks.cleanups.push(hook),
            HookKind::Cancellation => hooks.cancellations.push(hook),
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.borrow();
        f.debug_struct("Resolver")
            .field("state", &self.deferred.state())
            .field("cleanups", &hooks.cleanups.len())
            .field("cancellations", &hooks.cancellations.len())
            .finish()
    }
}
