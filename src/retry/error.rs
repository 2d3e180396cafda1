//! Error types for retry operations.

use std::time::Duration;

/// Why the retry loop stopped before the operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GiveUpReason {
    /// Every permitted attempt was used.
    AttemptsExhausted,
    /// The failure kind is excluded from retries by the policy's lists.
    NonRetryable,
    /// The failure is a fatal process-level condition.
    Fatal,
}

impl std::fmt::Display for GiveUpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AttemptsExhausted => f.write_str("attempts exhausted"),
            Self::NonRetryable => f.write_str("non-retryable failure"),
            Self::Fatal => f.write_str("fatal failure"),
        }
    }
}

/// Error returned when the retry loop gives up.
///
/// Contains the final error along with metadata about the retry sequence.
///
/// # Examples
///
/// ```rust
/// use breakwater::{AttemptError, Failure, Orchestrator, ResilienceError, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::exponential(Duration::from_millis(1))
///     .with_max_attempts(3);
///
/// let result = Orchestrator::new(policy)
///     .execute(|| async { Err::<(), _>(Failure::new("io", "always fails")) })
///     .await;
///
/// match result {
///     Err(ResilienceError::Exhausted(exhausted)) => {
///         assert_eq!(exhausted.attempts, 3);
///         assert!(matches!(exhausted.final_error, AttemptError::Failed(_)));
///     }
///     _ => panic!("Expected exhaustion"),
/// }
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// The error from the final attempt.
    pub final_error: E,
    /// Total number of attempts made.
    pub attempts: u32,
    /// Total time spent, waits included.
    pub total_duration: Duration,
    /// Why no further attempt was made.
    pub reason: GiveUpReason,
}

impl<E> RetryExhausted<E> {
    /// Create a new RetryExhausted error.
    pub fn new(
        final_error: E,
        attempts: u32,
        total_duration: Duration,
        reason: GiveUpReason,
    ) -> Self {
        Self {
            final_error,
            attempts,
            total_duration,
            reason,
        }
    }

    /// Extract the final error, discarding metadata.
    pub fn into_error(self) -> E {
        self.final_error
    }

    /// Get a reference to the final error.
    pub fn error(&self) -> &E {
        &self.final_error
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "gave up after {} attempts ({}, {:?}): {}",
            self.attempts, self.reason, self.total_duration, self.final_error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.final_error)
    }
}
