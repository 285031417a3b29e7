#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```ignore
//! #[macro_use]
//! mod common;
//! use common::*;
//! ```

use oxide::{Resolver, Scheduler, Task};
use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Default seed for property tests when running under CI.
pub const DEFAULT_PROPTEST_SEED: u64 = 0x5EED_5EED;

/// The delay the timer-based conformance tests settle after.
pub const SETTLE_AFTER: Duration = Duration::from_millis(1000);

const PROPTEST_SEED_ENV: &str = "OXIDE_PROPTEST_SEED";
const PROPTEST_MAX_SHRINK_ITERS_ENV: &str = "OXIDE_PROPTEST_MAX_SHRINK_ITERS";

/// Configuration for property tests with optional deterministic seed support.
#[derive(Debug, Clone)]
pub struct PropertyTestConfig {
    /// Fixed seed for reproducibility (overrides CI default when set).
    pub seed: Option<u64>,
    /// Number of successful cases required.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl PropertyTestConfig {
    /// Build a config with defaults for property tests.
    #[must_use]
    pub fn new(cases: u32) -> Self {
        Self {
            seed: read_proptest_seed(),
            cases,
            max_shrink_iters: read_max_shrink_iters()
                .unwrap_or(ProptestConfig::default().max_shrink_iters),
        }
    }

    /// Convert into a ProptestConfig, applying deterministic seed rules.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        let mut config = ProptestConfig::with_cases(self.cases);

        // Honor existing PROPTEST_RNG_SEED, otherwise apply our own.
        if matches!(config.rng_seed, RngSeed::Random) {
            if let Some(seed) = self.seed {
                config.rng_seed = RngSeed::Fixed(seed);
            }
        }

        config.max_shrink_iters = self.max_shrink_iters;
        config
    }
}

/// Build a ProptestConfig with deterministic seed support for CI.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    PropertyTestConfig::new(cases).to_proptest_config()
}

fn read_proptest_seed() -> Option<u64> {
    if let Ok(value) = std::env::var(PROPTEST_SEED_ENV) {
        return value.parse::<u64>().ok();
    }

    // If CI is set and no explicit seed is provided, use a fixed seed.
    if std::env::var("CI").is_ok() {
        return Some(DEFAULT_PROPTEST_SEED);
    }

    None
}

fn read_max_shrink_iters() -> Option<u32> {
    std::env::var(PROPTEST_MAX_SHRINK_ITERS_ENV)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
}

/// Initialize test logging with trace-level output.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
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

/// Resolvers captured by a [`manual_task`], one per run.
pub struct ManualRuns<T> {
    resolvers: Rc<RefCell<Vec<Resolver<T>>>>,
}

impl<T: 'static> ManualRuns<T> {
    /// Number of times the task ran.
    pub fn count(&self) -> usize {
        self.resolvers.borrow().len()
    }

    /// The resolver handed to run number `index`.
    pub fn resolver(&self, index: usize) -> Resolver<T> {
        self.resolvers.borrow()[index].clone()
    }
}

/// A task that stays pending and hands every run's resolver to the test.
pub fn manual_task<T: 'static>() -> (Task<T>, ManualRuns<T>) {
    let resolvers = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&resolvers);
    let task = Task::new(move |resolver| sink.borrow_mut().push(resolver));
    (task, ManualRuns { resolvers })
}

/// A scheduler with default configuration, logging enabled.
pub fn test_scheduler() -> Scheduler {
    init_test_logging();
    Scheduler::new()
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
            Some(::oxide::Settlement::Resolved(v)) => assert_eq!(v, $expected),
            other => panic!("expected Resolved({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that an execution rejected, optionally with a specific reason text.
#[macro_export]
macro_rules! assert_rejected {
    ($execution:expr) => {
        match $execution.settlement() {
            Some(::oxide::Settlement::Rejected(_)) => {}
            other => panic!("expected Rejected, got {:?}", other),
        }
    };
    ($execution:expr, $reason:expr) => {
        match $execution.settlement() {
            Some(::oxide::Settlement::Rejected(reason)) => {
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
            ::oxide::SettlementState::Cancelled,
            "expected execution to be cancelled"
        )
    };
}
