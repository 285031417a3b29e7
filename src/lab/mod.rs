//! Deterministic lab scheduler for testing.
//!
//! The lab scheduler provides:
//!
//! - Virtual time (no wall-clock dependencies)
//! - Deterministic timer order (deadline, then scheduling order)
//! - Timer tasks (`delay`, `delay_rejected`) that clear their timer when
//!   cancelled
//! - `block_on` for driving a [`Promise`](crate::Promise) to completion

pub mod config;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use scheduler::{Scheduler, TimerHandle};
