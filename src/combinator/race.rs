//! Race combinator: the first settlement wins.
//!
//! ```text
//! left.or(&right):
//!   run left, run right
//!   on first settlement of either side (resolved, rejected or cancelled):
//!     cancel the other side
//!     settle with the winner's outcome
//! ```
//!
//! This is a strict race. A fast rejection beats a slow resolution, and a
//! side that gets cancelled on its own cancels the race. A `done` guard
//! makes sure only the first settlement is honored.
//!
//! # Algebraic Laws
//!
//! - Identity: `a.or(&never) ≃ a` (never = task that never settles)
//! - Associativity: `a.or(&b).or(&c) ≃ a.or(&b.or(&c))` up to which side of
//!   a simultaneous settlement wins

use std::cell::Cell;
use std::rc::Rc;

use crate::execution::Execution;
use crate::task::{Resolver, Task};
use crate::types::Settlement;

/// Builds the listener for one racer.
fn racer<T: Clone + 'static>(
    name: &'static str,
    done: Rc<Cell<bool>>,
    resolver: Resolver<T>,
    loser: Execution<T>,
) -> impl FnOnce(&Settlement<T>) {
    move |settled| {
        if done.replace(true) {
            return;
        }
        tracing::debug!(
            winner = name,
            loser = %loser.id(),
            outcome = %settled.state(),
            "race settled; cancelling loser"
        );
        loser.cancel();
        resolver.forward(settled);
    }
}

impl<T: Clone + 'static> Task<T> {
    /// Runs both tasks and settles with whichever settles first.
    ///
    /// Also callable as `Task::or(&left, &right)`.
    #[must_use]
    pub fn or(&self, other: &Task<T>) -> Task<T> {
        let (left, right) = (self.clone(), other.clone());
        Task::new(move |resolver: Resolver<T>| {
            let left_execution = left.run();
            let right_execution = right.run();
            {
                let (left, right) = (left_execution.clone(), right_execution.clone());
                resolver.on_cancelled(move || {
                    left.cancel();
                    right.cancel();
                });
            }

            let done = Rc::new(Cell::new(false));
            left_execution.listen(racer(
                "left",
                Rc::clone(&done),
                resolver.clone(),
                right_execution.clone(),
            ));
            right_execution.listen(racer("right", done, resolver, left_execution.clone()));
        })
    }
}
