//! The shared circuit breaker state machine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::config::CircuitConfig;
use super::error::CircuitOpen;
use crate::failure::Classify;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Threshold breached, calls fail fast.
    Open,
    /// Cooldown elapsed, calls probe whether the dependency recovered.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::Open => f.write_str("open"),
            Self::HalfOpen => f.write_str("half-open"),
        }
    }
}

/// A point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitSnapshot {
    /// Current state.
    pub state: CircuitState,
    /// Qualifying failures counted since the last success.
    pub failure_count: u32,
    /// Time since the most recent qualifying failure.
    pub since_last_failure: Option<Duration>,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// A circuit breaker guarding one dependency.
///
/// Create one per protected dependency and share it with every caller through
/// an `Arc`. All state lives behind a mutex, so concurrent callers never lose
/// updates.
///
/// ```text
/// Closed ──threshold reached──▶ Open ──recovery_timeout elapsed──▶ HalfOpen
///   ▲                                ▲                                │
///   └──────────── success ───────────┼──────────── failure ───────────┘
/// ```
///
/// While half-open every caller is let through; there is no single-probe token.
///
/// # Example
///
/// ```rust
/// use breakwater::{CircuitBreaker, CircuitConfig, CircuitState, Failure};
/// use std::time::Duration;
///
/// let breaker = CircuitBreaker::new(
///     "inventory",
///     CircuitConfig::new()
///         .with_failure_threshold(2)
///         .with_recovery_timeout(Duration::from_secs(10)),
/// );
///
/// breaker.record_failure(&Failure::new("connection", "refused"));
/// assert!(breaker.allow_call());
///
/// breaker.record_failure(&Failure::new("connection", "refused"));
/// assert_eq!(breaker.state(), CircuitState::Open);
/// assert!(!breaker.allow_call());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    name: Arc<str>,
    config: CircuitConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: impl Into<Arc<str>>, config: CircuitConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    /// The breaker's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The breaker's configuration.
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    /// Current state.
    ///
    /// This does not perform the open to half-open transition; only a gate
    /// check does.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Qualifying failures counted since the last success.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// A consistent view of state, count and failure age.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            since_last_failure: inner.last_failure.map(|t| t.elapsed()),
        }
    }

    /// Returns true if a call may proceed.
    ///
    /// An open breaker whose recovery timeout has elapsed moves to half-open
    /// and lets the call through.
    pub fn allow_call(&self) -> bool {
        self.check().is_ok()
    }

    /// Gate check with diagnostics: `Err` carries the state that refused the call.
    pub fn check(&self) -> Result<(), CircuitOpen> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = inner.last_failure.map(|t| t.elapsed());
                match elapsed {
                    Some(elapsed) if elapsed < self.config.recovery_timeout => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            circuit = %self.name,
                            failures = inner.failure_count,
                            "circuit open, call rejected"
                        );
                        Err(CircuitOpen {
                            name: self.name.clone(),
                            state: inner.state,
                            failure_count: inner.failure_count,
                            retry_after: Some(self.config.recovery_timeout - elapsed),
                            attempts: 0,
                        })
                    }
                    _ => {
                        inner.state = CircuitState::HalfOpen;
                        #[cfg(feature = "tracing")]
                        tracing::info!(circuit = %self.name, "circuit half-open, probing");
                        Ok(())
                    }
                }
            }
        }
    }

    /// Report a successful call: clears the failure count and closes a
    /// half-open breaker.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.failure_count = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            #[cfg(feature = "tracing")]
            tracing::info!(circuit = %self.name, "circuit closed");
        }
    }

    /// Report a failed call.
    ///
    /// Failures that don't qualify under the breaker's [`Qualify`](super::Qualify)
    /// filter are ignored. A qualifying failure reopens a half-open breaker
    /// immediately and opens a closed one once the threshold is reached.
    pub fn record_failure<F: Classify + ?Sized>(&self, failure: &F) {
        let kind = failure.kind();
        if !self.config.qualify.matches(&kind) {
            return;
        }

        let mut inner = self.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        let opens = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.failure_count >= self.config.failure_threshold,
            CircuitState::Open => false,
        };
        if opens {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                circuit = %self.name,
                from = %inner.state,
                failures = inner.failure_count,
                kind = %kind,
                "circuit opened"
            );
            inner.state = CircuitState::Open;
        }
    }

    // Every update leaves `Inner` consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod breaker_tests {
    use super::*;
    use crate::circuit::Qualify;
    use crate::failure::FailureKind;

    fn breaker(threshold: u32, recovery: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitConfig::new()
                .with_failure_threshold(threshold)
                .with_recovery_timeout(recovery),
        )
    }

    #[test]
    fn test_starts_closed() {
        let cb = breaker(3, Duration::from_secs(1));
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.allow_call());
    }

    #[test]
    fn test_opens_at_threshold() {
        let cb = breaker(3, Duration::from_secs(60));
        let err = FailureKind::new("io");

        cb.record_failure(&err);
        cb.record_failure(&err);
        assert_eq!(cb.state(), CircuitState::Closed);

        cb.record_failure(&err);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_call());
    }

    #[test]
    fn test_success_resets_count() {
        let cb = breaker(3, Duration::from_secs(60));
        let err = FailureKind::new("io");

        cb.record_failure(&err);
        cb.record_failure(&err);
        cb.record_success();
        cb.record_failure(&err);

        assert_eq!(cb.failure_count(), 1);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_non_qualifying_failures_ignored() {
        let cb = CircuitBreaker::new(
            "db",
            CircuitConfig::new()
                .with_failure_threshold(1)
                .with_qualify(Qualify::only(["connection"])),
        );

        cb.record_failure(&FailureKind::new("constraint"));
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.state(), CircuitState::Closed);

        cb.record_failure(&FailureKind::new("connection"));
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_zero_recovery_probes_immediately() {
        let cb = breaker(1, Duration::ZERO);
        cb.record_failure(&FailureKind::new("io"));
        assert_eq!(cb.state(), CircuitState::Open);

        assert!(cb.allow_call());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_check_reports_diagnostics() {
        let cb = breaker(2, Duration::from_secs(30));
        cb.record_failure(&FailureKind::new("io"));
        cb.record_failure(&FailureKind::new("io"));

        let open = cb.check().unwrap_err();
        assert_eq!(&*open.name, "test");
        assert_eq!(open.state, CircuitState::Open);
        assert_eq!(open.failure_count, 2);
        assert!(open.retry_after.unwrap() <= Duration::from_secs(30));
    }

    #[test]
    fn test_snapshot() {
        let cb = breaker(5, Duration::from_secs(30));
        assert_eq!(cb.snapshot().since_last_failure, None);

        cb.record_failure(&FailureKind::new("io"));
        let snap = cb.snapshot();
        assert_eq!(snap.state, CircuitState::Closed);
        assert_eq!(snap.failure_count, 1);
        assert!(snap.since_last_failure.is_some());
    }
}
