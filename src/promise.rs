//! Awaitable adapter for executions.
//!
//! [`Promise`] bridges the four-state settlement model into Rust's
//! two-state [`Future`]: `Resolved(v)` becomes `Ok(v)`, `Rejected(r)`
//! becomes `Err(r)`, and `Cancelled` becomes `Err(Reason::Cancelled)`.
//!
//! A promise registers a listener on the execution when it is created, so
//! it observes the outcome even if it is first polled after settlement.
//! Dropping a promise does not cancel the execution.

use core::fmt;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::deferred::Deferred;
use crate::execution::Execution;
use crate::types::Reason;

struct Slot<T> {
    result: Option<Result<T, Reason>>,
    waker: Option<Waker>,
    taken: bool,
}

/// A future that completes with an execution's outcome.
#[must_use = "futures do nothing unless polled"]
pub struct Promise<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T: Clone + 'static> Promise<T> {
    fn watch(deferred: &Deferred<T>) -> Self {
        let slot = Rc::new(RefCell::new(Slot {
            result: None,
            waker: None,
            taken: false,
        }));
        let sink = Rc::clone(&slot);
        deferred.listen(move |settled| {
            let waker = {
                let mut slot = sink.borrow_mut();
                slot.result = Some(settled.clone().into_result());
                slot.waker.take()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
        });
        Self { slot }
    }

    /// Returns true once the underlying execution has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let slot = self.slot.borrow();
        slot.taken || slot.result.is_some()
    }
}

impl<T> Future for Promise<T> {
    type Output = Result<T, Reason>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        assert!(!slot.taken, "Promise polled after completion");
        if let Some(result) = slot.result.take() {
            slot.taken = true;
            return Poll::Ready(result);
        }
        match &slot.waker {
            Some(waker) if waker.will_wake(cx.waker()) => {}
            _ => slot.waker = Some(cx.waker().clone()),
        }
        Poll::Pending
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("Promise")
            .field("settled", &(slot.taken || slot.result.is_some()))
            .field("taken", &slot.taken)
            .finish()
    }
}

impl<T: Clone + 'static> Execution<T> {
    /// Returns a future that completes with this execution's outcome.
    pub fn promise(&self) -> Promise<T> {
        Promise::watch(self.deferred())
    }
}

impl<T: Clone + 'static> Deferred<T> {
    /// Returns a future that completes with this cell's outcome.
    pub fn promise(&self) -> Promise<T> {
        Promise::watch(self)
    }
}
