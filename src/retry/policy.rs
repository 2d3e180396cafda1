//! Retry policy types and configuration.

use std::collections::BTreeSet;
use std::time::Duration;

use super::backoff::{Backoff, JitterStrategy, DEFAULT_JITTER};
use super::error::GiveUpReason;
use crate::error::ConfigError;
use crate::failure::{Classify, FailureKind};

/// A retry policy describing when and how to retry failed operations.
///
/// Policies are pure data - they describe retry behavior but don't execute it.
/// A policy is built once per call-site and shared by every invocation; all
/// decision methods take `&self` and have no side effects.
///
/// # Classification
///
/// For a failed attempt the policy answers, in order:
///
/// 1. Fatal kinds ([`FailureKind::FATAL`]) never retry.
/// 2. Kinds in the non-retryable set never retry.
/// 3. If a retryable allowlist is set, only kinds on it retry.
/// 4. Otherwise the failure retries while `attempt < max_attempts`.
///
/// # Examples
///
/// ```rust
/// use breakwater::{FailureKind, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::exponential(Duration::from_secs(1))
///     .with_max_attempts(3)
///     .with_non_retryable(["auth"]);
///
/// assert!(policy.should_retry(&FailureKind::new("connection"), 1));
/// assert!(!policy.should_retry(&FailureKind::new("auth"), 1));
/// assert!(!policy.should_retry(&FailureKind::new("connection"), 3));
///
/// assert_eq!(policy.delay_for(1), Duration::from_secs(1));
/// assert_eq!(policy.delay_for(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    retryable: BTreeSet<FailureKind>,
    non_retryable: BTreeSet<FailureKind>,
    per_attempt_timeout: Option<Duration>,
}

/// The outcome of asking a policy about a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait and try again.
    Retry,
    /// Stop and surface the failure.
    GiveUp(GiveUpReason),
}

impl RetryDecision {
    /// Returns true for [`RetryDecision::Retry`].
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry)
    }
}

/// Information about a failed attempt, passed to retry hooks.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before next attempt, `None` when the loop is giving up.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since first attempt.
    pub elapsed: Duration,
}

impl RetryPolicy {
    /// Create a policy with default settings: 3 attempts, 1s base delay doubling
    /// up to 60s, ±25% jitter.
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
            retryable: BTreeSet::new(),
            non_retryable: BTreeSet::new(),
            per_attempt_timeout: None,
        }
    }

    /// Create a policy with exponentially increasing delay and no jitter.
    ///
    /// Delay = base * 2^(attempt - 1), capped at 60s.
    ///
    /// ```rust
    /// use breakwater::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(100))
    ///     .with_max_attempts(5);
    ///
    /// assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    /// assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    /// assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    /// ```
    pub fn exponential(base: Duration) -> Self {
        Self {
            backoff: Backoff::new(base, 2.0, Duration::from_secs(60)),
            ..Self::new()
        }
    }

    /// A policy that makes exactly one attempt.
    ///
    /// Useful for putting a circuit breaker in front of an operation without
    /// retrying it.
    pub fn no_retry() -> Self {
        Self::new().with_max_attempts(1)
    }

    /// Set the hard ceiling on invocations, initial attempt included.
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_base_delay(mut self, d: Duration) -> Self {
        self.backoff.base_delay = d;
        self
    }

    /// Set the maximum delay cap.
    ///
    /// The un-jittered delay never exceeds this value.
    pub fn with_max_delay(mut self, d: Duration) -> Self {
        self.backoff.max_delay = d;
        self
    }

    /// Set the per-attempt multiplier.
    pub fn with_exponential_base(mut self, base: f64) -> Self {
        self.backoff.exponential_base = base;
        self
    }

    /// Add ±25% randomness to delays.
    pub fn with_jitter(mut self) -> Self {
        self.backoff.jitter = JitterStrategy::Proportional(DEFAULT_JITTER);
        self
    }

    /// Add ±`factor` randomness to delays. The factor is clamped to `[0, 1]`.
    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.backoff.jitter = JitterStrategy::Proportional(factor.clamp(0.0, 1.0));
        self
    }

    /// Disable jitter.
    pub fn without_jitter(mut self) -> Self {
        self.backoff.jitter = JitterStrategy::None;
        self
    }

    /// Restrict retries to the given kinds.
    pub fn with_retryable<K>(mut self, kinds: impl IntoIterator<Item = K>) -> Self
    where
        K: Into<FailureKind>,
    {
        self.retryable.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Never retry the given kinds. Takes precedence over the allowlist.
    pub fn with_non_retryable<K>(mut self, kinds: impl IntoIterator<Item = K>) -> Self
    where
        K: Into<FailureKind>,
    {
        self.non_retryable.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Bound every single attempt by `d`.
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.per_attempt_timeout = Some(d);
        self
    }

    /// Get the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Get the backoff calculator.
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Get the retryable allowlist. Empty means "everything not excluded".
    pub fn retryable(&self) -> &BTreeSet<FailureKind> {
        &self.retryable
    }

    /// Get the non-retryable set.
    pub fn non_retryable(&self) -> &BTreeSet<FailureKind> {
        &self.non_retryable
    }

    /// Get the per-attempt timeout.
    pub fn per_attempt_timeout(&self) -> Option<Duration> {
        self.per_attempt_timeout
    }

    /// Returns true if jitter is enabled.
    pub fn jitter_enabled(&self) -> bool {
        self.backoff.jitter.factor() > 0.0
    }

    /// Decide what to do after attempt number `attempt` (1-indexed) failed.
    pub fn decide<F: Classify + ?Sized>(&self, failure: &F, attempt: u32) -> RetryDecision {
        let kind = failure.kind();

        if kind.is_fatal() {
            return RetryDecision::GiveUp(GiveUpReason::Fatal);
        }
        if self.non_retryable.contains(&kind) {
            return RetryDecision::GiveUp(GiveUpReason::NonRetryable);
        }
        if !self.retryable.is_empty() && !self.retryable.contains(&kind) {
            return RetryDecision::GiveUp(GiveUpReason::NonRetryable);
        }
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp(GiveUpReason::AttemptsExhausted);
        }

        RetryDecision::Retry
    }

    /// Returns true if another attempt should follow failed attempt `attempt`.
    pub fn should_retry<F: Classify + ?Sized>(&self, failure: &F, attempt: u32) -> bool {
        self.decide(failure, attempt).is_retry()
    }

    /// The wait after failed attempt `attempt` (1-indexed), jitter included.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Validate the configuration.
    ///
    /// ```rust
    /// use breakwater::RetryPolicy;
    ///
    /// assert!(RetryPolicy::new().validate().is_ok());
    /// assert!(RetryPolicy::new().with_max_attempts(0).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        let base = self.backoff.exponential_base;
        if !base.is_finite() || base <= 1.0 {
            return Err(ConfigError::InvalidExponentialBase(base));
        }
        if self.backoff.base_delay > self.backoff.max_delay {
            return Err(ConfigError::BaseDelayExceedsMax {
                base_delay: self.backoff.base_delay,
                max_delay: self.backoff.max_delay,
            });
        }
        if let Some(timeout) = self.per_attempt_timeout {
            if timeout.is_zero() {
                return Err(ConfigError::ZeroTimeout);
            }
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
