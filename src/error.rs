//! Terminal errors and configuration errors.

use std::time::Duration;

use crate::circuit::CircuitOpen;
use crate::failure::AttemptError;
use crate::retry::RetryExhausted;

/// The failure outcome of an orchestrated call.
///
/// A caller gets exactly one of: the operation's success value, a
/// [`ResilienceError::Exhausted`] carrying the last real failure, or a
/// [`ResilienceError::CircuitOpen`] when the breaker refused the call.
#[derive(Debug)]
pub enum ResilienceError<E> {
    /// The retry loop gave up.
    Exhausted(RetryExhausted<AttemptError<E>>),
    /// The circuit breaker denied the call; the operation was not invoked.
    CircuitOpen(CircuitOpen),
}

impl<E> ResilienceError<E> {
    /// Returns true if the breaker short-circuited the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen(_))
    }

    /// Returns true if the retry loop gave up.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// Number of operation invocations made before the call failed.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted(e) => e.attempts,
            Self::CircuitOpen(open) => open.attempts,
        }
    }

    /// The last failure of the operation, if the loop gave up.
    pub fn last_failure(&self) -> Option<&AttemptError<E>> {
        match self {
            Self::Exhausted(e) => Some(&e.final_error),
            Self::CircuitOpen(_) => None,
        }
    }

    /// Extract the operation's own last error, if there is one.
    ///
    /// Returns `None` for circuit-open errors and for attempts that timed out.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Exhausted(e) => e.final_error.into_inner(),
            Self::CircuitOpen(_) => None,
        }
    }
}

impl<E> From<CircuitOpen> for ResilienceError<E> {
    fn from(open: CircuitOpen) -> Self {
        Self::CircuitOpen(open)
    }
}

impl<E> From<RetryExhausted<AttemptError<E>>> for ResilienceError<E> {
    fn from(exhausted: RetryExhausted<AttemptError<E>>) -> Self {
        Self::Exhausted(exhausted)
    }
}

impl<E: std::fmt::Display> std::fmt::Display for ResilienceError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted(e) => write!(f, "{}", e),
            Self::CircuitOpen(open) => write!(f, "{}", open),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ResilienceError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Exhausted(e) => Some(e),
            Self::CircuitOpen(open) => Some(open),
        }
    }
}

/// An invalid retry or breaker configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `max_attempts` must be at least 1.
    ZeroMaxAttempts,
    /// The backoff multiplier must be finite and greater than 1.
    InvalidExponentialBase(f64),
    /// The base delay is larger than the cap.
    BaseDelayExceedsMax {
        /// Configured base delay.
        base_delay: Duration,
        /// Configured cap.
        max_delay: Duration,
    },
    /// A configured timeout of zero would fail every attempt.
    ZeroTimeout,
    /// `failure_threshold` must be at least 1.
    ZeroFailureThreshold,
    /// No preset has this name.
    UnknownProfile(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroMaxAttempts => f.write_str("max_attempts must be at least 1"),
            Self::InvalidExponentialBase(base) => {
                write!(f, "exponential_base must be finite and > 1, got {}", base)
            }
            Self::BaseDelayExceedsMax {
                base_delay,
                max_delay,
            } => write!(
                f,
                "base_delay {:?} exceeds max_delay {:?}",
                base_delay, max_delay
            ),
            Self::ZeroTimeout => f.write_str("timeout must be greater than zero"),
            Self::ZeroFailureThreshold => f.write_str("failure_threshold must be at least 1"),
            Self::UnknownProfile(name) => write!(f, "unknown retry profile '{}'", name),
        }
    }
}

impl std::error::Error for ConfigError {}
