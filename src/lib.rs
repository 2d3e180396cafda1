//! # Breakwater
//!
//! > *"Let the storm break on the wall, not on the harbor"*
//!
//! Retry policies and circuit breakers for unreliable operations: network
//! calls, database queries, LLM invocations.
//!
//! ## Pieces
//!
//! - [`RetryPolicy`] - pure data: attempt ceiling, exponential backoff with
//!   optional ±25% jitter, failure classification, per-attempt timeout
//! - [`CircuitBreaker`] - a mutex-guarded state machine shared by every caller
//!   of one dependency
//! - [`Orchestrator`] - the attempt loop composing the two, for async and
//!   blocking operations
//! - [`ResilienceError`] - the terminal outcome: retries exhausted, or circuit open
//!
//! Failures are classified through the [`Classify`] trait into a
//! [`FailureKind`]; policies and breakers decide on kinds, not error types.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use breakwater::{
//!     CircuitBreaker, CircuitConfig, Failure, Orchestrator, ResilienceError, RetryPolicy,
//! };
//!
//! # tokio_test::block_on(async {
//! let breaker = Arc::new(CircuitBreaker::new(
//!     "geocoder",
//!     CircuitConfig::new()
//!         .with_failure_threshold(2)
//!         .with_recovery_timeout(Duration::from_secs(10)),
//! ));
//!
//! let geocoder = Orchestrator::new(
//!     RetryPolicy::exponential(Duration::from_millis(1)).with_max_attempts(3),
//! )
//! .with_breaker(breaker.clone());
//!
//! let result = geocoder
//!     .execute(|| async { Err::<(f64, f64), _>(Failure::new("connection", "refused")) })
//!     .await;
//!
//! // The second failure opened the breaker, so the third attempt never ran.
//! match result {
//!     Err(ResilienceError::CircuitOpen(open)) => assert_eq!(open.attempts, 2),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! # });
//! ```
//!
//! ## Features
//!
//! - `tracing`: log retries, give-ups and breaker transitions through `tracing`
//! - `serde`: `Serialize`/`Deserialize` for policies and breaker configuration

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod circuit;
pub mod error;
pub mod failure;
pub mod orchestrator;
pub mod retry;
pub mod testing;

// Re-exports
pub use circuit::{
    CircuitBreaker, CircuitConfig, CircuitOpen, CircuitSnapshot, CircuitState, Qualify,
};
pub use error::{ConfigError, ResilienceError};
pub use failure::{AttemptError, Classify, Failure, FailureKind};
pub use orchestrator::Orchestrator;
pub use retry::{
    Backoff, GiveUpReason, JitterStrategy, Profile, RetryDecision, RetryEvent, RetryExhausted,
    RetryPolicy,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::circuit::{CircuitBreaker, CircuitConfig, CircuitState, Qualify};
    pub use crate::error::ResilienceError;
    pub use crate::failure::{AttemptError, Classify, Failure, FailureKind};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::retry::{Profile, RetryEvent, RetryPolicy};
}
