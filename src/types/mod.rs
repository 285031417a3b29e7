//! Core types for settlement and rejection.
//!
//! - [`outcome`]: settlement state machine states and terminal outcomes
//! - [`reason`]: rejection reasons and captured panic payloads
//! - [`id`]: execution identifiers

pub mod id;
pub mod outcome;
pub mod reason;

pub use id::ExecutionId;
pub use outcome::{Settlement, SettlementState};
pub use reason::{PanicPayload, Reason};
