//! Settlement outcomes and the settlement state machine.
//!
//! A settlement cell moves from `Pending` to exactly one terminal state:
//!
//! - `Resolved(T)`: the computation produced a value
//! - `Rejected(Reason)`: the computation failed
//! - `Cancelled`: the computation was abandoned on request
//!
//! [`Settlement`] is the closed variant handed to listeners. Every dispatch
//! site matches it exhaustively, so a listener cannot silently ignore an
//! outcome it forgot about.

use super::reason::Reason;
use core::fmt;

/// The observable state of a settlement cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlementState {
    /// Not settled yet.
    Pending,
    /// Settled with a value.
    Resolved,
    /// Settled with a rejection reason.
    Rejected,
    /// Settled by cancellation.
    Cancelled,
}

impl SettlementState {
    /// Returns true for every state except `Pending`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for SettlementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Resolved => write!(f, "resolved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The terminal outcome of a settlement cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement<T> {
    /// The computation produced a value.
    Resolved(T),
    /// The computation failed.
    Rejected(Reason),
    /// The computation was cancelled.
    Cancelled,
}

impl<T> Settlement<T> {
    /// Returns the state this settlement puts a cell in.
    #[must_use]
    pub const fn state(&self) -> SettlementState {
        match self {
            Self::Resolved(_) => SettlementState::Resolved,
            Self::Rejected(_) => SettlementState::Rejected,
            Self::Cancelled => SettlementState::Cancelled,
        }
    }

    /// Returns true if this is `Resolved`.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns true if this is `Rejected`.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns true if this is `Cancelled`.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Borrows the resolved value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Resolved(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the rejection reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<&Reason> {
        match self {
            Self::Rejected(r) => Some(r),
            _ => None,
        }
    }

    /// Maps the resolved value, passing rejection and cancellation through.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Settlement<U> {
        match self {
            Self::Resolved(v) => Settlement::Resolved(f(v)),
            Self::Rejected(r) => Settlement::Rejected(r),
            Self::Cancelled => Settlement::Cancelled,
        }
    }

    /// Collapses the settlement into the two-outcome `Result` model.
    ///
    /// Cancellation becomes [`Reason::Cancelled`], which displays as
    /// `"Cancelled"`.
    pub fn into_result(self) -> Result<T, Reason> {
        match self {
            Self::Resolved(v) => Ok(v),
            Self::Rejected(r) => Err(r),
            Self::Cancelled => Err(Reason::Cancelled),
        }
    }
}

impl<T, E: Into<Reason>> From<Result<T, E>> for Settlement<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Resolved(v),
            Err(e) => Self::Rejected(e.into()),
        }
    }
}
