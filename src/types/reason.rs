//! Rejection reasons.
//!
//! A [`Reason`] is the payload of a rejected settlement. It is cheap to clone
//! because every listener on a cell observes the same reason.

use core::fmt;
use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

/// Payload from a caught panic.
///
/// Transformation closures passed to combinators run under panic capture; a
/// panic there is converted into a rejection carrying this payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicPayload {
    message: String,
}

impl PanicPayload {
    /// Creates a new panic payload with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extracts a human-readable message from a raw panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(s) = payload.downcast_ref::<&str>() {
            Self::new(*s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Self::new(s.clone())
        } else {
            Self::new("unknown panic")
        }
    }

    /// Returns the panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic: {}", self.message)
    }
}

/// Why a task was rejected.
#[derive(Debug, Clone)]
pub enum Reason {
    /// A plain message.
    Message(Arc<str>),
    /// A wrapped error value.
    Error(Arc<dyn StdError + Send + Sync>),
    /// A transformation closure panicked.
    Panicked(PanicPayload),
    /// Cancellation, as surfaced by the two-outcome adapters.
    Cancelled,
    /// Rejected without a reason.
    Unspecified,
}

impl Reason {
    /// Creates a message reason.
    #[must_use]
    pub fn message(message: impl Into<Arc<str>>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps an error value.
    #[must_use]
    pub fn error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Error(Arc::new(error))
    }

    /// Returns true if this reason stands for a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if this reason came from a captured panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// Attempts to downcast a wrapped error.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Error(e) => e.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(m) => f.write_str(m),
            Self::Error(e) => write!(f, "{e}"),
            Self::Panicked(p) => write!(f, "{p}"),
            Self::Cancelled => f.write_str("Cancelled"),
            Self::Unspecified => f.write_str("rejected"),
        }
    }
}

impl PartialEq for Reason {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Message(a), Self::Message(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => Arc::ptr_eq(a, b) || a.to_string() == b.to_string(),
            (Self::Panicked(a), Self::Panicked(b)) => a == b,
            (Self::Cancelled, Self::Cancelled) | (Self::Unspecified, Self::Unspecified) => true,
            _ => false,
        }
    }
}

impl From<&str> for Reason {
    fn from(message: &str) -> Self {
        Self::Message(Arc::from(message))
    }
}

impl From<String> for Reason {
    fn from(message: String) -> Self {
        Self::Message(Arc::from(message))
    }
}

impl From<PanicPayload> for Reason {
    fn from(payload: PanicPayload) -> Self {
        Self::Panicked(payload)
    }
}

impl From<Arc<dyn StdError + Send + Sync>> for Reason {
    fn from(error: Arc<dyn StdError + Send + Sync>) -> Self {
        Self::Error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("bad request: {0}")]
    struct BadRequest(u16);

    #[test]
    fn display_variants() {
        assert_eq!(Reason::from("Bad Request").to_string(), "Bad Request");
        assert_eq!(Reason::error(BadRequest(400)).to_string(), "bad request: 400");
        assert_eq!(
            Reason::from(PanicPayload::new("Bad Idea")).to_string(),
            "panic: Bad Idea"
        );
        assert_eq!(Reason::Cancelled.to_string(), "Cancelled");
        assert_eq!(Reason::Unspecified.to_string(), "rejected");
    }

    #[test]
    fn downcast_wrapped_error() {
        let reason = Reason::error(BadRequest(422));
        assert_eq!(reason.downcast_ref::<BadRequest>().map(|e| e.0), Some(422));
        assert!(Reason::from("text").downcast_ref::<BadRequest>().is_none());
    }

    #[test]
    fn panic_payload_from_str_and_string() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(PanicPayload::from_panic(boxed.as_ref()).message(), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(PanicPayload::from_panic(boxed.as_ref()).message(), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(17_u8);
        assert_eq!(PanicPayload::from_panic(boxed.as_ref()).message(), "unknown panic");
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Reason::from("a"), Reason::message("a"));
        assert_ne!(Reason::from("a"), Reason::from("b"));
        assert_ne!(Reason::Cancelled, Reason::Unspecified);
        assert_eq!(Reason::error(BadRequest(1)), Reason::error(BadRequest(1)));
    }
}
