//! Algebraic law property tests for task combinators.
//!
//! # Laws Tested
//!
//! ## Monad Laws (and_then)
//! - Left identity: `of(x).and_then(f) ≃ f(x)`
//! - Right identity: `t.and_then(of) ≃ t`
//! - Associativity: `t.and_then(f).and_then(g) ≃ t.and_then(|v| f(v).and_then(g))`
//!
//! ## Functor Laws (map)
//! - Identity: `t.map(id) ≃ t`
//! - Composition: `t.map(f).map(g) ≃ t.map(g ∘ f)`
//!
//! ## Concurrency Laws
//! - LAW-AND-ORDER: `and` resolves in input order whatever the completion order
//! - LAW-OR-FIRST: `or` settles with whichever side settles first
//!
//! Two tasks are `≃` when running each on a fresh lab scheduler until idle
//! produces the same settlement.

#[macro_use]
mod common;

use common::*;
use oxide::{Scheduler, Settlement, Task};
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Arbitrary task shapes
// ============================================================================

/// How a generated task settles.
#[derive(Debug, Clone)]
enum Shape {
    Resolve(i32),
    Reject(String),
    Cancel,
    ResolveAfter(u64, i32),
    RejectAfter(u64, String),
}

impl Shape {
    fn build(&self, scheduler: &Scheduler) -> Task<i32> {
        match self {
            Self::Resolve(v) => Task::of(*v),
            Self::Reject(reason) => Task::rejected(reason.clone()),
            Self::Cancel => Task::cancelled(),
            Self::ResolveAfter(ms, v) => scheduler.delay(Duration::from_millis(*ms), *v),
            Self::RejectAfter(ms, reason) => {
                scheduler.delay_rejected(Duration::from_millis(*ms), reason.clone())
            }
        }
    }

    /// Virtual time at which this shape settles.
    fn settles_at(&self) -> u64 {
        match self {
            Self::Resolve(_) | Self::Reject(_) | Self::Cancel => 0,
            Self::ResolveAfter(ms, _) | Self::RejectAfter(ms, _) => *ms,
        }
    }
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        any::<i32>().prop_map(Shape::Resolve),
        "[a-z]{1,10}".prop_map(Shape::Reject),
        Just(Shape::Cancel),
        (1u64..1000, any::<i32>()).prop_map(|(ms, v)| Shape::ResolveAfter(ms, v)),
        (1u64..1000, "[a-z]{1,10}").prop_map(|(ms, r)| Shape::RejectAfter(ms, r)),
    ]
}

/// A continuation `i32 -> Task<i32>` described by data.
#[derive(Debug, Clone, Copy)]
enum Step {
    Add(i32),
    RejectOdd,
    DelayedDouble(u64),
}

impl Step {
    fn apply(self, scheduler: &Scheduler, value: i32) -> Task<i32> {
        match self {
            Self::Add(k) => Task::of(value.wrapping_add(k)),
            Self::RejectOdd if value % 2 != 0 => Task::rejected(format!("odd: {value}")),
            Self::RejectOdd => Task::of(value),
            Self::DelayedDouble(ms) => {
                scheduler.delay(Duration::from_millis(ms), value.wrapping_mul(2))
            }
        }
    }

    fn bind(self, scheduler: &Scheduler) -> impl Fn(i32) -> Task<i32> + Clone + 'static {
        let scheduler = scheduler.clone();
        move |value| self.apply(&scheduler, value)
    }
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        any::<i32>().prop_map(Step::Add),
        Just(Step::RejectOdd),
        (1u64..500).prop_map(Step::DelayedDouble),
    ]
}

/// Runs the task built by `build` on a fresh scheduler until idle.
fn settle<T: Clone + 'static>(build: impl FnOnce(&Scheduler) -> Task<T>) -> Settlement<T> {
    let scheduler = Scheduler::new();
    let execution = build(&scheduler).run();
    scheduler.run_until_idle().expect("scheduler goes idle");
    execution.settlement().expect("settled once idle")
}

// ============================================================================
// Monad laws
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(256))]

    #[test]
    fn left_identity(x in any::<i32>(), f in arb_step()) {
        init_test_logging_with_level(tracing::Level::INFO);
        let lhs = settle(|s| Task::of(x).and_then(f.bind(s)));
        let rhs = settle(|s| f.apply(s, x));
        prop_assert_eq!(lhs, rhs);
    }

    #[test]
    fn right_identity(shape in arb_shape()) {
        let lhs = settle(|s| shape.build(s).and_then(Task::of));
        let rhs = settle(|s| shape.build(s));
        prop_assert_eq!(lhs, rhs);
    }

    #[test]
    fn associativity(shape in arb_shape(), f in arb_step(), g in arb_step()) {
        let lhs = settle(|s| shape.build(s).and_then(f.bind(s)).and_then(g.bind(s)));
        let rhs = settle(|s| {
            let (f, g) = (f.bind(s), g.bind(s));
            shape.build(s).and_then(move |v| f(v).and_then(g.clone()))
        });
        prop_assert_eq!(lhs, rhs);
    }
}

// ============================================================================
// Functor laws
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(256))]

    #[test]
    fn map_identity(shape in arb_shape()) {
        let lhs = settle(|s| shape.build(s).map(|v| v));
        let rhs = settle(|s| shape.build(s));
        prop_assert_eq!(lhs, rhs);
    }

    #[test]
    fn map_composition(shape in arb_shape(), a in any::<i32>(), b in any::<i32>()) {
        let lhs = settle(|s| {
            shape
                .build(s)
                .map(move |v| v.wrapping_add(a))
                .map(move |v| v.wrapping_mul(b))
        });
        let rhs = settle(|s| shape.build(s).map(move |v| v.wrapping_add(a).wrapping_mul(b)));
        prop_assert_eq!(lhs, rhs);
    }
}

// ============================================================================
// Concurrency laws
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(256))]

    /// LAW-AND-ORDER
    #[test]
    fn and_resolves_in_input_order(
        left in any::<i32>(),
        right in any::<i32>(),
        left_ms in 0u64..1000,
        right_ms in 0u64..1000,
    ) {
        let settled = settle(|s| {
            s.delay(Duration::from_millis(left_ms), left)
                .and(&s.delay(Duration::from_millis(right_ms), right))
        });
        prop_assert_eq!(settled, Settlement::Resolved((left, right)));
    }

    /// LAW-OR-FIRST
    #[test]
    fn or_settles_with_first(left in arb_shape(), right in arb_shape()) {
        let raced = settle(|s| left.build(s).or(&right.build(s)));
        // Left wins ties: it is listened to first.
        let winner = if right.settles_at() < left.settles_at() { &right } else { &left };
        let alone = settle(|s| winner.build(s));
        prop_assert_eq!(raced, alone);
    }

    #[test]
    fn and_failure_matches_first_failing_side(left in arb_shape(), right in arb_shape()) {
        let joined = settle(|s| left.build(s).and(&right.build(s)));
        match joined {
            Settlement::Resolved((l, r)) => {
                prop_assert_eq!(settle(|s| left.build(s)), Settlement::Resolved(l));
                prop_assert_eq!(settle(|s| right.build(s)), Settlement::Resolved(r));
            }
            failure => {
                let (l, r) = (settle(|s| left.build(s)), settle(|s| right.build(s)));
                let first_failure = match (l.is_resolved(), r.is_resolved()) {
                    (false, true) => l,
                    (true, false) => r,
                    _ if right.settles_at() < left.settles_at() => r,
                    _ => l,
                };
                prop_assert_eq!(failure.map(|_: (i32, i32)| ()), first_failure.map(|_| ()));
            }
        }
    }
}
