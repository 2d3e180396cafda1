//! Integration tests for the retry loop.

use super::*;
use crate::failure::{AttemptError, Failure, FailureKind};
use crate::testing::FlakyOperation;
use crate::{Orchestrator, ResilienceError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn transient() -> Failure {
    Failure::new("connection", "transient failure")
}

fn assert_close(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(5),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_on_third_attempt() {
    let starts = Arc::new(Mutex::new(Vec::new()));
    let attempts = Arc::new(AtomicU32::new(0));

    let policy = RetryPolicy::exponential(Duration::from_secs(1)).with_max_attempts(3);
    let result = Orchestrator::new(policy)
        .execute({
            let starts = starts.clone();
            let attempts = attempts.clone();
            move || {
                starts.lock().unwrap().push(Instant::now());
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(transient())
                    } else {
                        Ok("success")
                    }
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "success");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    let starts = starts.lock().unwrap();
    assert_close(starts[1] - starts[0], Duration::from_secs(1));
    assert_close(starts[2] - starts[1], Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_hook_reports_exact_delays() {
    let op = FlakyOperation::new(2, transient(), 42);
    let mut delays = Vec::new();

    let result = Orchestrator::new(RetryPolicy::exponential(Duration::from_secs(1)))
        .execute_with_hooks(
            || op.call_async(),
            |event: &RetryEvent<'_, AttemptError<Failure>>| delays.push(event.next_delay),
        )
        .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(
        delays,
        vec![Some(Duration::from_secs(1)), Some(Duration::from_secs(2))]
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhausted_returns_final_error() {
    let op = FlakyOperation::<(), _>::always_failing(transient());

    let result = Orchestrator::new(
        RetryPolicy::exponential(Duration::from_millis(10)).with_max_attempts(4),
    )
    .execute(|| op.call_async())
    .await;

    match result {
        Err(ResilienceError::Exhausted(exhausted)) => {
            assert_eq!(exhausted.attempts, 4);
            assert_eq!(exhausted.reason, GiveUpReason::AttemptsExhausted);
            assert_eq!(
                exhausted.final_error.inner().map(Failure::message),
                Some("transient failure")
            );
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert_eq!(op.calls(), 4);
}

#[tokio::test]
async fn test_non_retryable_fails_after_one_attempt() {
    let op = FlakyOperation::<(), _>::always_failing(Failure::new("auth", "bad token"));

    let result = Orchestrator::new(
        RetryPolicy::exponential(Duration::from_millis(1))
            .with_max_attempts(5)
            .with_non_retryable(["auth"]),
    )
    .execute(|| op.call_async())
    .await;

    match result {
        Err(ResilienceError::Exhausted(exhausted)) => {
            assert_eq!(exhausted.attempts, 1);
            assert_eq!(exhausted.reason, GiveUpReason::NonRetryable);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert_eq!(op.calls(), 1);
}

#[tokio::test]
async fn test_fatal_failure_propagates_immediately() {
    let op = FlakyOperation::<(), _>::always_failing(Failure::new(
        FailureKind::OUT_OF_MEMORY,
        "allocation failed",
    ));

    let result = Orchestrator::new(
        RetryPolicy::exponential(Duration::from_millis(1))
            .with_max_attempts(5)
            .with_retryable([FailureKind::OUT_OF_MEMORY]),
    )
    .execute(|| op.call_async())
    .await;

    match result {
        Err(ResilienceError::Exhausted(exhausted)) => {
            assert_eq!(exhausted.reason, GiveUpReason::Fatal);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert_eq!(op.calls(), 1);
}

#[tokio::test]
async fn test_single_attempt_policy_never_retries() {
    let op = FlakyOperation::new(1, transient(), ());

    let result = Orchestrator::new(RetryPolicy::no_retry())
        .execute(|| op.call_async())
        .await;

    assert_eq!(result.unwrap_err().attempts(), 1);
    assert_eq!(op.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried() {
    let attempts = Arc::new(AtomicU32::new(0));

    let result = Orchestrator::new(
        RetryPolicy::exponential(Duration::from_millis(1))
            .with_max_attempts(5)
            .with_timeout(Duration::from_millis(10)),
    )
    .execute(|| {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                // First two attempts take too long
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Ok::<_, Failure>("success")
        }
    })
    .await;

    assert_eq!(result.unwrap(), "success");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_exhaustion_reports_timeout_kind() {
    let op = FlakyOperation::new(0, transient(), ()).with_latency(Duration::from_secs(1));

    let result = Orchestrator::new(
        RetryPolicy::exponential(Duration::from_millis(1))
            .with_max_attempts(2)
            .with_timeout(Duration::from_millis(50)),
    )
    .execute(|| op.call_async())
    .await;

    match result {
        Err(ResilienceError::Exhausted(exhausted)) => {
            assert_eq!(exhausted.attempts, 2);
            assert!(matches!(
                exhausted.final_error,
                AttemptError::Timeout { duration } if duration == Duration::from_millis(50)
            ));
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_can_be_classified_non_retryable() {
    let op = FlakyOperation::new(0, transient(), ()).with_latency(Duration::from_secs(5));

    let result = Orchestrator::new(
        RetryPolicy::exponential(Duration::from_millis(1))
            .with_max_attempts(3)
            .with_timeout(Duration::from_millis(5))
            .with_non_retryable([FailureKind::TIMEOUT]),
    )
    .execute(|| op.call_async())
    .await;

    assert_eq!(result.unwrap_err().attempts(), 1);
    assert_eq!(op.calls(), 1);
}

#[tokio::test]
async fn test_policy_is_shared_across_concurrent_calls() {
    let orchestrator =
        Orchestrator::new(RetryPolicy::exponential(Duration::from_millis(1)).with_max_attempts(3));

    let ops: Vec<_> = (0..8).map(|_| FlakyOperation::new(2, transient(), 1u32)).collect();
    let results =
        futures::future::join_all(ops.iter().map(|op| orchestrator.execute(|| op.call_async())))
            .await;

    let total: u32 = results.into_iter().map(|r| r.unwrap()).sum();
    assert_eq!(total, 8);
    assert!(ops.iter().all(|op| op.calls() == 3));
}

#[tokio::test]
async fn test_io_errors_are_classified() {
    let attempts = AtomicU32::new(0);

    let result = Orchestrator::new(
        RetryPolicy::exponential(Duration::from_millis(1))
            .with_max_attempts(3)
            .with_retryable(["connection"]),
    )
    .execute(|| {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            let kind = match n {
                0 => std::io::ErrorKind::ConnectionReset,
                _ => std::io::ErrorKind::PermissionDenied,
            };
            Err::<(), _>(std::io::Error::from(kind))
        }
    })
    .await;

    let exhausted = match result {
        Err(ResilienceError::Exhausted(e)) => e,
        other => panic!("expected exhaustion, got {:?}", other),
    };
    assert_eq!(exhausted.attempts, 2);
    assert_eq!(exhausted.reason, GiveUpReason::NonRetryable);
}
