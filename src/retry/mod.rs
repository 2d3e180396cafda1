//! Retry policies with exponential backoff.
//!
//! This module is the pure half of the crate:
//!
//! - **Pure data**: [`RetryPolicy`] and [`Backoff`] have no side effects, so they
//!   are easy to test, clone and share between tasks
//! - **Classified**: decisions match on [`FailureKind`](crate::FailureKind), not
//!   on error types
//! - **Declarative**: describe *what* retry behavior you want; the
//!   [`Orchestrator`](crate::Orchestrator) does the waiting
//!
//! # Quick Start
//!
//! ```rust
//! use breakwater::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::exponential(Duration::from_millis(100))
//!     .with_max_attempts(4)
//!     .with_max_delay(Duration::from_millis(250));
//!
//! assert_eq!(policy.delay_for(1), Duration::from_millis(100));
//! assert_eq!(policy.delay_for(2), Duration::from_millis(200));
//! assert_eq!(policy.delay_for(3), Duration::from_millis(250));
//! ```
//!
//! # Jitter
//!
//! Jitter adds randomness to delays so concurrent callers don't retry in
//! lockstep. With jitter enabled each delay is drawn uniformly from ±25% of the
//! capped delay:
//!
//! ```rust
//! use breakwater::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::exponential(Duration::from_millis(100)).with_jitter();
//! let d = policy.delay_for(1);
//! assert!(d >= Duration::from_millis(75) && d <= Duration::from_millis(125));
//! ```
//!
//! # Error Types
//!
//! - [`RetryExhausted`]: returned when the loop gives up, contains the final error and metadata

mod backoff;
mod error;
mod policy;
mod profiles;

pub use backoff::{Backoff, JitterStrategy, DEFAULT_JITTER};
pub use error::{GiveUpReason, RetryExhausted};
pub use policy::{RetryDecision, RetryEvent, RetryPolicy};
pub use profiles::Profile;

#[cfg(test)]
mod tests;
