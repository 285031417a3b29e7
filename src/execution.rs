//! Running instances of tasks.
//!
//! An [`Execution`] pairs the settlement cell created by one `Task::run`
//! call with the task that produced it, and owns the list of *linked*
//! child executions. Cancelling an execution cancels its own cell if it is
//! still pending and then cancels every linked child, depth first:
//!
//! ```text
//! cancel(E):
//!   E.cell.maybe_cancel()
//!   for child in E.links: cancel(child)
//! ```
//!
//! Links are referenced, not owned: a child that already settled stays
//! settled when its parent is cancelled.

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::deferred::Deferred;
use crate::task::Task;
use crate::types::{ExecutionId, Settlement, SettlementState};

/// Something that can be cancelled as part of a cascade.
///
/// Linked children of different value types are stored behind this trait.
pub trait Cancel {
    /// Requests cancellation.
    fn cancel(&self);
}

struct ExecutionInner<T> {
    id: ExecutionId,
    task: Task<T>,
    deferred: Deferred<T>,
    links: RefCell<SmallVec<[Rc<dyn Cancel>; 2]>>,
}

impl<T> Cancel for ExecutionInner<T> {
    fn cancel(&self) {
        let cancelled = self.deferred.maybe_cancel();
        // Snapshot so that a child may link further executions while we walk.
        let links = self.links.borrow().clone();
        tracing::debug!(
            execution = %self.id,
            transitioned = cancelled,
            links = links.len(),
            "cancelling execution"
        );
        for link in links {
            link.cancel();
        }
    }
}

/// A running (or finished) instance of a [`Task`].
///
/// Cloning an `Execution` clones the handle.
pub struct Execution<T> {
    inner: Rc<ExecutionInner<T>>,
}

impl<T> Clone for Execution<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Execution<T> {
    pub(crate) fn new(task: Task<T>, deferred: Deferred<T>) -> Self {
        Self {
            inner: Rc::new(ExecutionInner {
                id: ExecutionId::next(),
                task,
                deferred,
                links: RefCell::new(SmallVec::new()),
            }),
        }
    }

    /// Returns this execution's id.
    #[must_use]
    pub fn id(&self) -> ExecutionId {
        self.inner.id
    }

    /// Returns the task this execution was started from.
    #[must_use]
    pub fn task(&self) -> &Task<T> {
        &self.inner.task
    }

    /// Returns the state of the underlying cell.
    #[must_use]
    pub fn state(&self) -> SettlementState {
        self.inner.deferred.state()
    }

    /// Returns true while the execution has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.deferred.is_pending()
    }

    /// Returns a copy of the terminal outcome, if settled.
    #[must_use]
    pub fn settlement(&self) -> Option<Settlement<T>>
    where
        T: Clone,
    {
        self.inner.deferred.settlement().map(|s| (*s).clone())
    }

    /// Returns the number of linked child executions.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.inner.links.borrow().len()
    }

    pub(crate) fn deferred(&self) -> &Deferred<T> {
        &self.inner.deferred
    }

    /// Cancels this execution if pending, then every linked child.
    pub fn cancel(&self) -> &Self {
        Cancel::cancel(&*self.inner);
        self
    }

    /// Registers a listener for the terminal outcome.
    ///
    /// Listeners registered after settlement run immediately.
    pub fn listen<F>(&self, listener: F) -> &Self
    where
        F: FnOnce(&Settlement<T>) + 'static,
    {
        self.inner.deferred.listen(listener);
        self
    }

    /// Links a child so that cancelling this execution also cancels it.
    pub fn link<U: 'static>(&self, child: &Execution<U>) -> &Self {
        let child: Rc<dyn Cancel> = Rc::<ExecutionInner<U>>::clone(&child.inner);
        self.inner.links.borrow_mut().push(child);
        self
    }
}

impl<T: 'static> Cancel for Execution<T> {
    fn cancel(&self) {
        Cancel::cancel(&*self.inner);
    }
}

impl<T> fmt::Debug for Execution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("id", &self.inner.id)
            .field("state", &self.inner.deferred.state())
            .field("links", &self.inner.links.borrow().len())
            .finish_non_exhaustive()
    }
}
