//! Join combinator: wait for every task to resolve.
//!
//! # Semantics
//!
//! `left.and(&right)`:
//! 1. Run both tasks when the combined task runs
//! 2. Collect each resolved value in its own slot
//! 3. Resolve with `(left, right)` once both slots are filled, in input
//!    order regardless of completion order
//!
//! **Fail fast**: the first side to reject or cancel wins. The combinator
//! cancels the other side, then settles with that failure. A guard flag
//! makes sure a second failure arriving later is ignored.
//!
//! Cancelling the combined execution cancels both sides.
//!
//! # Wider Joins
//!
//! [`wait_all3`] and [`wait_all4`] nest `and` to the right and flatten the
//! nested pairs into a flat tuple. No value is ever dropped: a resolved
//! `0`, `""` or `false` is part of the result like any other value.

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::execution::Cancel;
use crate::task::{Resolver, Task};
use crate::types::Settlement;

/// Shared bookkeeping for one run of a join.
struct JoinState<A, B> {
    left: Option<A>,
    right: Option<B>,
    failed: bool,
}

impl<A, B> JoinState<A, B> {
    const fn new() -> Self {
        Self {
            left: None,
            right: None,
            failed: false,
        }
    }

    /// Takes both values once both sides resolved.
    fn take_ready(&mut self) -> Option<(A, B)> {
        if self.left.is_some() && self.right.is_some() {
            self.left.take().zip(self.right.take())
        } else {
            None
        }
    }
}

/// Which side of the join a listener watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Builds the listener for one side of a join.
fn side_listener<A, B, V, S>(
    side: Side,
    state: Rc<RefCell<JoinState<A, B>>>,
    resolver: Resolver<(A, B)>,
    sibling: S,
    store: fn(&mut JoinState<A, B>, V),
) -> impl FnOnce(&Settlement<V>)
where
    A: 'static,
    B: 'static,
    V: Clone + 'static,
    S: Cancel + 'static,
{
    move |settled| {
        if let Settlement::Resolved(value) = settled {
            let ready = {
                let mut state = state.borrow_mut();
                if state.failed {
                    return;
                }
                store(&mut *state, value.clone());
                state.take_ready()
            };
            if let Some(pair) = ready {
                resolver.resolve(pair);
            }
            return;
        }

        {
            let mut state = state.borrow_mut();
            if state.failed {
                return;
            }
            state.failed = true;
        }
        tracing::debug!(
            %side,
            outcome = %settled.state(),
            "join side failed; cancelling sibling"
        );
        sibling.cancel();
        match settled {
            Settlement::Rejected(reason) => resolver.reject(reason.clone()),
            Settlement::Cancelled | Settlement::Resolved(_) => resolver.cancel(),
        }
    }
}

impl<A: Clone + 'static> Task<A> {
    /// Runs both tasks and resolves with both values.
    ///
    /// Also callable as `Task::and(&left, &right)`.
    #[must_use]
    pub fn and<B: Clone + 'static>(&self, other: &Task<B>) -> Task<(A, B)> {
        let (left, right) = (self.clone(), other.clone());
        Task::new(move |resolver: Resolver<(A, B)>| {
            let left_execution = left.run();
            let right_execution = right.run();
            {
                let (left, right) = (left_execution.clone(), right_execution.clone());
                resolver.on_cancelled(move || {
                    left.cancel();
                    right.cancel();
                });
            }

            let state = Rc::new(RefCell::new(JoinState::new()));
            left_execution.listen(side_listener(
                Side::Left,
                Rc::clone(&state),
                resolver.clone(),
                right_execution.clone(),
                |state: &mut JoinState<A, B>, value: A| state.left = Some(value),
            ));
            right_execution.listen(side_listener(
                Side::Right,
                state,
                resolver,
                left_execution.clone(),
                |state: &mut JoinState<A, B>, value: B| state.right = Some(value),
            ));
        })
    }
}

/// Resolves with both values once both tasks resolve.
#[must_use]
pub fn wait_all2<A, B>(a: &Task<A>, b: &Task<B>) -> Task<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    a.and(b)
}

/// Resolves with all three values, in input order.
#[must_use]
pub fn wait_all3<A, B, C>(a: &Task<A>, b: &Task<B>, c: &Task<C>) -> Task<(A, B, C)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
{
    a.and(&b.and(c)).map(|(a, (b, c))| (a, b, c))
}

/// Resolves with all four values, in input order.
#[must_use]
pub fn wait_all4<A, B, C, D>(
    a: &Task<A>,
    b: &Task<B>,
    c: &Task<C>,
    d: &Task<D>,
) -> Task<(A, B, C, D)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    D: Clone + 'static,
{
    a.and(&b.and(&c.and(d)))
        .map(|(a, (b, (c, d)))| (a, b, c, d))
}
