//! Property-based tests for delay calculation and retry decisions

use breakwater::retry::{Backoff, JitterStrategy, DEFAULT_JITTER};
use breakwater::{FailureKind, GiveUpReason, RetryDecision, RetryPolicy};
use proptest::prelude::*;
use std::time::Duration;

fn kind_name() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}"
}

proptest! {
    #[test]
    fn prop_delay_matches_formula_without_jitter(
        base_ms in 1u64..1_000,
        max_ms in 1_000u64..120_000,
        attempt in 1u32..10,
    ) {
        let backoff = Backoff::new(
            Duration::from_millis(base_ms),
            2.0,
            Duration::from_millis(max_ms),
        );

        let expected = (base_ms << (attempt - 1)).min(max_ms);
        prop_assert_eq!(backoff.delay(attempt), Duration::from_millis(expected));
    }

    #[test]
    fn prop_raw_delay_never_exceeds_cap(
        base_ms in 0u64..10_000,
        exponential_base in 1.0f64..10.0,
        max_ms in 0u64..100_000,
        attempt in 0u32..=u32::MAX,
    ) {
        let backoff = Backoff::new(
            Duration::from_millis(base_ms),
            exponential_base,
            Duration::from_millis(max_ms),
        );

        prop_assert!(backoff.raw_delay(attempt) <= Duration::from_millis(max_ms));
    }

    #[test]
    fn prop_raw_delay_is_monotonic(
        base_ms in 1u64..1_000,
        exponential_base in 1.0f64..4.0,
        attempt in 1u32..64,
    ) {
        let backoff = Backoff::new(
            Duration::from_millis(base_ms),
            exponential_base,
            Duration::from_secs(60),
        );

        prop_assert!(backoff.raw_delay(attempt) <= backoff.raw_delay(attempt + 1));
    }

    #[test]
    fn prop_jitter_stays_within_a_quarter(
        base_ms in 1u64..1_000,
        attempt in 1u32..12,
    ) {
        let backoff = Backoff::new(
            Duration::from_millis(base_ms),
            2.0,
            Duration::from_secs(60),
        )
        .with_jitter();

        let raw = backoff.raw_delay(attempt).as_secs_f64();
        let jittered = backoff.delay(attempt).as_secs_f64();
        // 1µs of slack for float rounding
        prop_assert!(jittered >= raw * (1.0 - DEFAULT_JITTER) - 1e-6);
        prop_assert!(jittered <= raw * (1.0 + DEFAULT_JITTER) + 1e-6);
    }

    #[test]
    fn prop_jitter_factor_bounds_offset(
        delay_ms in 0u64..100_000,
        factor in 0.0f64..=1.0,
    ) {
        let delay = Duration::from_millis(delay_ms);
        let jittered = JitterStrategy::Proportional(factor).apply(delay).as_secs_f64();
        let raw = delay.as_secs_f64();

        prop_assert!(jittered >= (raw * (1.0 - factor) - 1e-6).max(0.0));
        prop_assert!(jittered <= raw * (1.0 + factor) + 1e-6);
    }

    #[test]
    fn prop_attempt_ceiling_is_respected(
        max_attempts in 1u32..20,
        attempt in 1u32..40,
    ) {
        let policy = RetryPolicy::new().with_max_attempts(max_attempts);
        let kind = FailureKind::new("connection");

        prop_assert_eq!(policy.should_retry(&kind, attempt), attempt < max_attempts);
    }

    #[test]
    fn prop_non_retryable_wins_over_retryable(
        name in kind_name(),
        attempt in 1u32..5,
    ) {
        let kind = FailureKind::new(name.clone());
        prop_assume!(!kind.is_fatal());
        let policy = RetryPolicy::new()
            .with_max_attempts(10)
            .with_retryable([name.clone()])
            .with_non_retryable([name]);

        prop_assert_eq!(
            policy.decide(&kind, attempt),
            RetryDecision::GiveUp(GiveUpReason::NonRetryable)
        );
    }

    #[test]
    fn prop_empty_allowlist_retries_anything(
        name in kind_name(),
        attempt in 1u32..5,
    ) {
        let kind = FailureKind::new(name);
        prop_assume!(!kind.is_fatal());
        let policy = RetryPolicy::new().with_max_attempts(10);

        prop_assert!(policy.should_retry(&kind, attempt));
    }

    #[test]
    fn prop_fatal_kinds_never_retry(
        listed in any::<bool>(),
        attempt in 1u32..5,
    ) {
        for kind in FailureKind::FATAL {
            let mut policy = RetryPolicy::new().with_max_attempts(10);
            if listed {
                policy = policy.with_retryable([kind.clone()]);
            }

            prop_assert_eq!(
                policy.decide(&kind, attempt),
                RetryDecision::GiveUp(GiveUpReason::Fatal)
            );
        }
    }
}
