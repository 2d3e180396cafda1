//! Circuit breaker configuration.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::ConfigError;
use crate::failure::FailureKind;

/// Which failures count toward a breaker's threshold.
///
/// Failures that don't qualify pass through without touching breaker state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Qualify {
    /// Every failure counts.
    #[default]
    Any,
    /// Only failures of these kinds count.
    Kinds(BTreeSet<FailureKind>),
}

impl Qualify {
    /// Count only the given kinds.
    ///
    /// ```rust
    /// use breakwater::{FailureKind, Qualify};
    ///
    /// let qualify = Qualify::only(["connection", "timeout"]);
    /// assert!(qualify.matches(&FailureKind::TIMEOUT));
    /// assert!(!qualify.matches(&FailureKind::new("validation")));
    /// ```
    pub fn only<K>(kinds: impl IntoIterator<Item = K>) -> Self
    where
        K: Into<FailureKind>,
    {
        Self::Kinds(kinds.into_iter().map(Into::into).collect())
    }

    /// Returns true if a failure of `kind` counts toward the threshold.
    pub fn matches(&self, kind: &FailureKind) -> bool {
        match self {
            Self::Any => true,
            Self::Kinds(kinds) => kinds.contains(kind),
        }
    }
}

/// Thresholds and timing for a [`CircuitBreaker`](super::CircuitBreaker).
///
/// ```rust
/// use breakwater::CircuitConfig;
/// use std::time::Duration;
///
/// let config = CircuitConfig::new()
///     .with_failure_threshold(2)
///     .with_recovery_timeout(Duration::from_secs(10));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CircuitConfig {
    /// Qualifying failures before the breaker opens.
    pub failure_threshold: u32,
    /// How long the breaker stays open before letting a probe through.
    pub recovery_timeout: Duration,
    /// Which failures count.
    pub qualify: Qualify,
}

impl CircuitConfig {
    /// 5 failures, 60 second recovery, every failure counts.
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            qualify: Qualify::Any,
        }
    }

    /// Set the number of qualifying failures that opens the breaker.
    pub fn with_failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    /// Set the cooldown before a probe is allowed.
    pub fn with_recovery_timeout(mut self, d: Duration) -> Self {
        self.recovery_timeout = d;
        self
    }

    /// Set which failures count toward the threshold.
    pub fn with_qualify(mut self, qualify: Qualify) -> Self {
        self.qualify = qualify;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        Ok(())
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self::new()
    }
}
