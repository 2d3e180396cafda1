//! Circuit breakers for failing dependencies.
//!
//! A [`CircuitBreaker`] is a gate in front of one dependency. After
//! `failure_threshold` qualifying failures it opens and every call fails fast
//! with [`CircuitOpen`] until `recovery_timeout` has passed; then calls probe
//! the dependency in the half-open state. A success closes the breaker, a
//! qualifying failure opens it again.
//!
//! Breakers are independent of retry policies. Compose the two with an
//! [`Orchestrator`](crate::Orchestrator), which checks the gate before every
//! attempt and reports each outcome back.
//!
//! ```rust
//! use std::sync::Arc;
//! use breakwater::{CircuitBreaker, CircuitConfig, Orchestrator, RetryPolicy};
//!
//! let breaker = Arc::new(CircuitBreaker::new("billing", CircuitConfig::default()));
//!
//! // Every call site for this dependency shares the same breaker.
//! let reads = Orchestrator::new(RetryPolicy::database()).with_breaker(breaker.clone());
//! let writes = Orchestrator::new(RetryPolicy::no_retry()).with_breaker(breaker);
//! # let _ = (reads, writes);
//! ```

mod breaker;
mod config;
mod error;

pub use breaker::{CircuitBreaker, CircuitSnapshot, CircuitState};
pub use config::{CircuitConfig, Qualify};
pub use error::CircuitOpen;
