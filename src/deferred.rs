//! The settlement cell.
//!
//! A [`Deferred`] is a single-assignment cell: it starts `Pending` and moves
//! to `Resolved`, `Rejected` or `Cancelled` exactly once. Listeners queued
//! while pending are invoked synchronously, in registration order, at the
//! moment of the transition; the queue is then drained. Listeners registered
//! after the transition are invoked immediately with the stored outcome.
//!
//! # Reentrancy
//!
//! No borrow of the cell is held while a listener runs, so a listener may
//! freely inspect the cell or register further listeners on it (those replay
//! immediately). A listener that attempts a second transition hits the
//! double-settlement guard like any other caller.
//!
//! The cell is single-threaded: it is shared through `Rc` and mutated only
//! from the thread that owns it.

use core::fmt;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::TaskError;
use crate::types::{Reason, Settlement, SettlementState};

/// A callback invoked once with the terminal outcome of a cell.
pub type Listener<T> = Box<dyn FnOnce(&Settlement<T>)>;

enum CellState<T> {
    Pending,
    Settled(Rc<Settlement<T>>),
}

struct Inner<T> {
    state: CellState<T>,
    listeners: SmallVec<[Listener<T>; 2]>,
}

/// A single-assignment settlement cell.
///
/// Cloning a `Deferred` clones the handle; both handles observe the same
/// cell.
pub struct Deferred<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deferred<T> {
    /// Creates a pending cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: CellState::Pending,
                listeners: SmallVec::new(),
            })),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SettlementState {
        match &self.inner.borrow().state {
            CellState::Pending => SettlementState::Pending,
            CellState::Settled(s) => s.state(),
        }
    }

    /// Returns true while the cell has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.inner.borrow().state, CellState::Pending)
    }

    /// Returns the shared terminal outcome, if settled.
    #[must_use]
    pub fn settlement(&self) -> Option<Rc<Settlement<T>>> {
        match &self.inner.borrow().state {
            CellState::Pending => None,
            CellState::Settled(s) => Some(Rc::clone(s)),
        }
    }

    /// Returns the number of listeners still queued.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Moves the cell to a terminal state and notifies queued listeners.
    ///
    /// Fails without touching the cell if it already settled.
    pub fn try_settle(&self, settlement: Settlement<T>) -> Result<(), TaskError> {
        let (settled, listeners) = {
            let mut inner = self.inner.borrow_mut();
            if let CellState::Settled(current) = &inner.state {
                return Err(TaskError::AlreadySettled {
                    attempted: settlement.state(),
                    current: current.state(),
                });
            }
            let settled = Rc::new(settlement);
            inner.state = CellState::Settled(Rc::clone(&settled));
            (settled, mem::take(&mut inner.listeners))
        };

        tracing::trace!(
            state = %settled.state(),
            listeners = listeners.len(),
            "deferred settled"
        );

        for listener in listeners {
            listener(&settled);
        }
        Ok(())
    }

    /// Resolves the cell with a value.
    ///
    /// # Panics
    ///
    /// Panics if the cell already settled.
    #[track_caller]
    pub fn resolve(&self, value: T) {
        if let Err(err) = self.try_settle(Settlement::Resolved(value)) {
            panic!("{err}");
        }
    }

    /// Rejects the cell with a reason.
    ///
    /// # Panics
    ///
    /// Panics if the cell already settled.
    #[track_caller]
    pub fn reject(&self, reason: impl Into<Reason>) {
        if let Err(err) = self.try_settle(Settlement::Rejected(reason.into())) {
            panic!("{err}");
        }
    }

    /// Cancels the cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell already settled; use [`maybe_cancel`] when racing
    /// against other settlements.
    ///
    /// [`maybe_cancel`]: Self::maybe_cancel
    #[track_caller]
    pub fn cancel(&self) {
        if let Err(err) = self.try_settle(Settlement::Cancelled) {
            panic!("{err}");
        }
    }

    /// Cancels the cell if it is still pending.
    ///
    /// Returns true if this call performed the transition.
    pub fn maybe_cancel(&self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.try_settle(Settlement::Cancelled).is_ok()
    }

    /// Registers a listener for the terminal outcome.
    ///
    /// If the cell already settled the listener runs immediately.
    pub fn listen<F>(&self, listener: F)
    where
        F: FnOnce(&Settlement<T>) + 'static,
    {
        let settled = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            match &inner.state {
                CellState::Pending => {
                    inner.listeners.push(Box::new(listener));
                    return;
                }
                CellState::Settled(s) => Rc::clone(s),
            }
        };
        listener(&settled);
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.state())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
