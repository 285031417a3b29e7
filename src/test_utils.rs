//! Test utilities for oxide.
//!
//! This module provides shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Manually settled tasks
//! - A single-poll helper for futures
//! - Settlement assertion macros
//!
//! # Example
//! ```ignore
//! use oxide::test_utils::{init_test_logging, manual_task};
//!
//! init_test_logging();
//! let (task, runs) = manual_task::<u8>();
//! let execution = task.run();
//! runs.resolver(0).resolve(7);
//! oxide::assert_resolved!(execution, 7);
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::sync::{Arc, Mutex, Once};
use std::task::{Context, Poll, Wake, Waker};

use tracing_subscriber::fmt::format::FmtSpan;

use crate::task::{Resolver, Task};

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Acquire the global environment lock for tests that mutate env vars.
///
/// # Panics
///
/// Panics if a previous holder panicked.
pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().expect("env lock poisoned")
}

/// Resolvers captured by a [`manual_task`], one per run.
pub struct ManualRuns<T> {
    resolvers: Rc<RefCell<Vec<Resolver<T>>>>,
}

impl<T: 'static> ManualRuns<T> {
    /// Number of times the task ran.
    #[must_use]
    pub fn count(&self) -> usize {
        self.resolvers.borrow().len()
    }

    /// The resolver handed to run number `index` (zero based).
    ///
    /// # Panics
    ///
    /// Panics if the task ran fewer than `index + 1` times.
    #[must_use]
    pub fn resolver(&self, index: usize) -> Resolver<T> {
        self.resolvers
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or_else(|| panic!("manual task ran {} times, wanted run {index}", self.count()))
    }
}

/// A task that stays pending and hands every run's resolver to the test.
#[must_use]
pub fn manual_task<T: 'static>() -> (Task<T>, ManualRuns<T>) {
    let resolvers = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&resolvers);
    let task = Task::new(move |resolver| sink.borrow_mut().push(resolver));
    (task, ManualRuns { resolvers })
}

struct NoopWaker;

impl Wake for NoopWaker {
    fn wake(self: Arc<Self>) {}
}

/// A waker that does nothing.
#[must_use]
pub fn noop_waker() -> Waker {
    Waker::from(Arc::new(NoopWaker))
}

/// Polls a future once with a no-op waker.
pub fn poll_once<F: Future>(future: F) -> Poll<F::Output> {
    let future = pin!(future);
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    future.poll(&mut cx)
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Assert that an execution resolved with a specific value.
#[macro_export]
macro_rules! assert_resolved {
    ($execution:expr, $expected:expr) => {
        match $execution.settlement() {
            Some($crate::Settlement::Resolved(v)) => assert_eq!(v, $expected),
            other => panic!("expected Resolved({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that an execution rejected, optionally with a specific reason text.
#[macro_export]
macro_rules! assert_rejected {
    ($execution:expr) => {
        match $execution.settlement() {
            Some($crate::Settlement::Rejected(_)) => {}
            other => panic!("expected Rejected, got {:?}", other),
        }
    };
    ($execution:expr, $reason:expr) => {
        match $execution.settlement() {
            Some($crate::Settlement::Rejected(reason)) => {
                assert_eq!(reason.to_string(), $reason)
            }
            other => panic!("expected Rejected({:?}), got {:?}", $reason, other),
        }
    };
}

/// Assert that an execution was cancelled.
#[macro_export]
macro_rules! assert_cancelled {
    ($execution:expr) => {
        assert_eq!(
            $execution.state(),
            $crate::SettlementState::Cancelled,
            "expected execution to be cancelled"
        )
    };
}
