//! The attempt loop that composes a retry policy with an optional breaker.
//!
//! One loop serves both calling conventions: [`Orchestrator::execute`] runs it
//! on tokio's timer, [`Orchestrator::execute_blocking`] drives the same loop on
//! the current thread.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::circuit::CircuitBreaker;
use crate::error::ResilienceError;
use crate::failure::{AttemptError, Classify};
use crate::retry::{RetryDecision, RetryEvent, RetryExhausted, RetryPolicy};

/// Runs operations under a [`RetryPolicy`] and, optionally, a shared
/// [`CircuitBreaker`].
///
/// Each invocation proceeds as:
///
/// 1. If a breaker is attached and refuses the call, fail with
///    [`ResilienceError::CircuitOpen`]. No attempt is consumed.
/// 2. Invoke the operation, bounded by the policy's per-attempt timeout.
/// 3. On success, report to the breaker and return the value.
/// 4. On failure, report to the breaker and ask the policy. Either wait
///    `delay_for(attempt)` and go back to 1, or fail with
///    [`ResilienceError::Exhausted`].
///
/// The orchestrator holds no per-call state, so one instance can serve any
/// number of concurrent calls.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use breakwater::{Failure, Orchestrator, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let counter = AtomicU32::new(0);
/// let calls = &counter;
/// let orchestrator = Orchestrator::new(
///     RetryPolicy::exponential(Duration::from_millis(1)).with_max_attempts(5),
/// );
///
/// let value = orchestrator
///     .execute(|| async move {
///         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///             Err(Failure::new("connection", "reset"))
///         } else {
///             Ok(42)
///         }
///     })
///     .await
///     .unwrap();
///
/// assert_eq!(value, 42);
/// assert_eq!(counter.load(Ordering::SeqCst), 3);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Orchestrator {
    policy: RetryPolicy,
    breaker: Option<Arc<CircuitBreaker>>,
}

/// How the loop waits and bounds attempts.
#[derive(Debug, Clone, Copy)]
enum Pacing {
    /// tokio timers; waits yield to the scheduler.
    Async,
    /// Thread sleeps; timeouts are checked after the attempt returns.
    Blocking,
}

impl Orchestrator {
    /// Create an orchestrator without a breaker.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            breaker: None,
        }
    }

    /// Gate a single attempt per call behind `breaker`, without retries.
    pub fn from_breaker(breaker: Arc<CircuitBreaker>) -> Self {
        Self::new(RetryPolicy::no_retry()).with_breaker(breaker)
    }

    /// Consult `breaker` before every attempt and report outcomes to it.
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// The retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The attached breaker, if any.
    pub fn breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.breaker.as_ref()
    }

    /// Run an async operation.
    ///
    /// `operation` is called once per attempt and must produce a fresh future
    /// each time. Waits between attempts use `tokio::time::sleep`, so this must
    /// run inside a tokio runtime.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        self.run(Pacing::Async, operation, |_: &RetryEvent<'_, AttemptError<E>>| {})
            .await
    }

    /// Run an async operation, calling `on_retry` after every failed attempt.
    ///
    /// The hook is synchronous and should not block; use it for logging and
    /// metrics. `next_delay` is `None` for the final, terminal failure.
    ///
    /// ```rust
    /// use breakwater::{AttemptError, Failure, Orchestrator, RetryEvent, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let mut seen = Vec::new();
    /// let result = Orchestrator::new(
    ///     RetryPolicy::exponential(Duration::from_millis(1)).with_max_attempts(3),
    /// )
    /// .execute_with_hooks(
    ///     || async { Err::<(), _>(Failure::new("io", "down")) },
    ///     |event: &RetryEvent<'_, AttemptError<Failure>>| seen.push(event.next_delay),
    /// )
    /// .await;
    ///
    /// assert!(result.is_err());
    /// assert_eq!(
    ///     seen,
    ///     vec![Some(Duration::from_millis(1)), Some(Duration::from_millis(2)), None]
    /// );
    /// # });
    /// ```
    pub async fn execute_with_hooks<T, E, F, Fut, H>(
        &self,
        operation: F,
        on_retry: H,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
        H: FnMut(&RetryEvent<'_, AttemptError<E>>),
    {
        self.run(Pacing::Async, operation, on_retry).await
    }

    /// Run a synchronous operation on the current thread.
    ///
    /// Uses the same loop as [`execute`](Self::execute), with `std::thread::sleep`
    /// for the waits. A running closure can't be interrupted, so a per-attempt
    /// timeout is enforced after the fact: an attempt that took longer than the
    /// bound counts as a timeout and its result is discarded.
    ///
    /// Don't call this from inside an async task; it blocks the thread.
    ///
    /// ```rust
    /// use breakwater::{Failure, Orchestrator, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// let mut calls = 0;
    /// let result = Orchestrator::new(
    ///     RetryPolicy::exponential(Duration::from_millis(1)).with_max_attempts(3),
    /// )
    /// .execute_blocking(|| {
    ///     calls += 1;
    ///     if calls < 2 { Err(Failure::new("io", "busy")) } else { Ok("done") }
    /// });
    ///
    /// assert_eq!(result.unwrap(), "done");
    /// ```
    pub fn execute_blocking<T, E, F>(&self, mut operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify,
    {
        futures::executor::block_on(self.run(
            Pacing::Blocking,
            || std::future::ready(operation()),
            |_: &RetryEvent<'_, AttemptError<E>>| {},
        ))
    }

    async fn run<T, E, F, Fut, H>(
        &self,
        pacing: Pacing,
        mut operation: F,
        mut on_retry: H,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
        H: FnMut(&RetryEvent<'_, AttemptError<E>>),
    {
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            if let Some(breaker) = &self.breaker {
                if let Err(mut open) = breaker.check() {
                    open.attempts = attempt;
                    return Err(ResilienceError::CircuitOpen(open));
                }
            }

            attempt += 1;
            let error = match pacing
                .attempt(self.policy.per_attempt_timeout(), &mut operation)
                .await
            {
                Ok(value) => {
                    if let Some(breaker) = &self.breaker {
                        breaker.record_success();
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if let Some(breaker) = &self.breaker {
                breaker.record_failure(&error);
            }

            match self.policy.decide(&error, attempt) {
                RetryDecision::Retry => {
                    let delay = self.policy.delay_for(attempt);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        attempt,
                        kind = %error.kind(),
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    on_retry(&RetryEvent {
                        attempt,
                        error: &error,
                        next_delay: Some(delay),
                        elapsed: start.elapsed(),
                    });
                    pacing.sleep(delay).await;
                }
                RetryDecision::GiveUp(reason) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        attempt,
                        kind = %error.kind(),
                        reason = %reason,
                        "giving up"
                    );
                    on_retry(&RetryEvent {
                        attempt,
                        error: &error,
                        next_delay: None,
                        elapsed: start.elapsed(),
                    });
                    return Err(ResilienceError::Exhausted(RetryExhausted::new(
                        error,
                        attempt,
                        start.elapsed(),
                        reason,
                    )));
                }
            }
        }
    }
}

impl Pacing {
    async fn attempt<T, E, F, Fut>(
        self,
        limit: Option<Duration>,
        operation: &mut F,
    ) -> Result<T, AttemptError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(limit) = limit else {
            return operation().await.map_err(AttemptError::Failed);
        };

        match self {
            Pacing::Async => match tokio::time::timeout(limit, operation()).await {
                Ok(result) => result.map_err(AttemptError::Failed),
                Err(_) => Err(AttemptError::Timeout { duration: limit }),
            },
            Pacing::Blocking => {
                let started = std::time::Instant::now();
                let result = operation().await;
                if started.elapsed() > limit {
                    Err(AttemptError::Timeout { duration: limit })
                } else {
                    result.map_err(AttemptError::Failed)
                }
            }
        }
    }

    async fn sleep(self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        match self {
            Pacing::Async => tokio::time::sleep(delay).await,
            Pacing::Blocking => std::thread::sleep(delay),
        }
    }
}
