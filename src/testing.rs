//! Testing utilities for code that uses Breakwater.
//!
//! Scripted operations and assertion macros for exercising retry loops and
//! breakers without a real flaky dependency.
//!
//! # Examples
//!
//! ## FlakyOperation
//!
//! ```rust
//! use breakwater::testing::FlakyOperation;
//! use breakwater::{Failure, Orchestrator, RetryPolicy};
//! use std::time::Duration;
//!
//! let op = FlakyOperation::new(2, Failure::new("io", "reset"), "ok");
//! let result = Orchestrator::new(
//!     RetryPolicy::exponential(Duration::from_millis(1)).with_max_attempts(3),
//! )
//! .execute_blocking(|| op.call());
//!
//! assert_eq!(result.unwrap(), "ok");
//! assert_eq!(op.calls(), 3);
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use breakwater::testing::FlakyOperation;
//! use breakwater::{assert_exhausted, Failure, Orchestrator, RetryPolicy};
//! use std::time::Duration;
//!
//! let op = FlakyOperation::<(), _>::always_failing(Failure::new("io", "down"));
//! let result = Orchestrator::new(
//!     RetryPolicy::exponential(Duration::from_millis(1)).with_max_attempts(2),
//! )
//! .execute_blocking(|| op.call());
//!
//! assert_exhausted!(result, 2);
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An operation that fails a fixed number of times, then succeeds.
///
/// Clones share the invocation counter, so a clone can be moved into the
/// operation closure while the original is kept for assertions.
#[derive(Debug, Clone)]
pub struct FlakyOperation<T, E> {
    calls: Arc<AtomicU32>,
    fail_times: u32,
    error: E,
    value: Option<T>,
    latency: Option<Duration>,
}

impl<T: Clone, E: Clone> FlakyOperation<T, E> {
    /// Fail `fail_times` times with `error`, then return `value` forever.
    pub fn new(fail_times: u32, error: E, value: T) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            fail_times,
            error,
            value: Some(value),
            latency: None,
        }
    }

    /// Never succeed.
    pub fn always_failing(error: E) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            fail_times: u32::MAX,
            error,
            value: None,
            latency: None,
        }
    }

    /// Make [`call_async`](Self::call_async) take `latency` before resolving.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Invoke synchronously.
    pub fn call(&self) -> Result<T, E> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_times {
            return Err(self.error.clone());
        }
        match &self.value {
            Some(value) => Ok(value.clone()),
            None => Err(self.error.clone()),
        }
    }

    /// Invoke asynchronously, sleeping for the configured latency.
    ///
    /// The invocation is counted when the call starts, so attempts cut short
    /// by a timeout still show up in [`calls`](Self::calls).
    pub fn call_async(&self) -> impl Future<Output = Result<T, E>> + 'static
    where
        T: 'static,
        E: 'static,
    {
        let outcome = self.call();
        let latency = self.latency;
        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            outcome
        }
    }
}

/// Assert that an orchestrated call gave up after exactly `attempts` invocations.
///
/// This macro will panic if the result is a success or a circuit-open error.
#[macro_export]
macro_rules! assert_exhausted {
    ($result:expr, $attempts:expr) => {
        match $result {
            Err($crate::ResilienceError::Exhausted(e)) => {
                assert_eq!(e.attempts, $attempts, "unexpected attempt count");
            }
            Err($crate::ResilienceError::CircuitOpen(open)) => {
                panic!("Expected Exhausted, got CircuitOpen: {}", open);
            }
            Ok(_) => panic!("Expected Exhausted, got Ok"),
        }
    };
}

/// Assert that an orchestrated call was short-circuited by a breaker.
///
/// This macro will panic if the result is a success or the retry loop gave up.
#[macro_export]
macro_rules! assert_circuit_open {
    ($result:expr) => {
        match $result {
            Err($crate::ResilienceError::CircuitOpen(_)) => {}
            Err($crate::ResilienceError::Exhausted(e)) => {
                panic!("Expected CircuitOpen, got Exhausted after {} attempts", e.attempts);
            }
            Ok(_) => panic!("Expected CircuitOpen, got Ok"),
        }
    };
}
