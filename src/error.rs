//! Error types for the task primitive.
//!
//! Error handling follows these principles:
//!
//! - Failures of a computation are *values*: they travel through the
//!   rejection channel as a [`Reason`](crate::types::Reason) and never
//!   escape a combinator.
//! - Misuse of a settlement cell is a *programmer error*: settling a cell
//!   twice, or registering a hook on a finished execution, means two code
//!   paths race for the same execution. The panicking operations report a
//!   [`TaskError`]; the `try_*` variants return it.
//! - Configuration and lab-scheduler errors are ordinary `Result` errors.

use core::fmt;
use std::time::Duration;

use crate::types::SettlementState;

/// The hook list a registration targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Hooks that run on any terminal settlement.
    Cleanup,
    /// Hooks that run only on cancellation.
    Cancellation,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cleanup => write!(f, "cleanup"),
            Self::Cancellation => write!(f, "cancellation"),
        }
    }
}

/// Misuse of a settlement cell or resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// A transition was attempted on a cell that already settled.
    #[error("only pending deferreds can be {attempted}; this deferred is already {current}")]
    AlreadySettled {
        /// The state the caller tried to move to.
        attempted: SettlementState,
        /// The state the cell is in.
        current: SettlementState,
    },
    /// A hook was registered after the execution settled.
    #[error("can't attach a {hook} handler after the task is {state}")]
    LateRegistration {
        /// Which hook list was targeted.
        hook: HookKind,
        /// The state the execution settled in.
        state: SettlementState,
    },
}

/// The error carried by a rejection produced by `Task::timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task timed out after {after:?}")]
pub struct TimeoutError {
    /// The virtual delay after which the timer fired.
    pub after: Duration,
}

/// Errors raised by the lab scheduler's driving loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// More timers fired than the configured step limit allows.
    #[error("scheduler exceeded {max_steps} steps without going idle")]
    StepLimitExceeded {
        /// The configured limit.
        max_steps: usize,
    },
    /// A future is still pending and no timer is left to wake it.
    #[error("future is pending with no timers scheduled")]
    Stalled,
}

/// Errors raised while building a scheduler configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidValue {
        /// The variable name.
        var: &'static str,
        /// What was expected.
        expected: &'static str,
        /// The raw value.
        value: String,
    },
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid TOML for this schema.
    #[cfg(feature = "config-file")]
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
