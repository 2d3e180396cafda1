//! Walks a flaky dependency through retries, an open breaker and recovery
//!
//! Run with: cargo run --example flaky_service --features tracing

use std::sync::Arc;
use std::time::Duration;

use breakwater::prelude::*;
use breakwater::testing::FlakyOperation;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let breaker = Arc::new(CircuitBreaker::new(
        "inventory",
        CircuitConfig::new()
            .with_failure_threshold(3)
            .with_recovery_timeout(Duration::from_millis(500)),
    ));
    let inventory = Orchestrator::new(
        RetryPolicy::exponential(Duration::from_millis(50))
            .with_max_attempts(3)
            .with_jitter(),
    )
    .with_breaker(breaker.clone());

    // Recovers on the third attempt
    let flaky = FlakyOperation::new(2, Failure::new("connection", "reset by peer"), 17u32);
    match inventory.execute(|| flaky.call_async()).await {
        Ok(stock) => tracing::info!(stock, "lookup succeeded"),
        Err(e) => tracing::error!("lookup failed: {}", e),
    }

    // A hard outage trips the breaker
    let outage = FlakyOperation::<u32, _>::always_failing(Failure::new("connection", "refused"));
    for _ in 0..2 {
        let result = inventory
            .execute_with_hooks(
                || outage.call_async(),
                |event: &RetryEvent<'_, AttemptError<Failure>>| {
                    tracing::info!(attempt = event.attempt, "hook saw failure: {}", event.error);
                },
            )
            .await;
        if let Err(e) = result {
            tracing::error!("lookup failed: {}", e);
        }
    }
    tracing::info!(snapshot = ?breaker.snapshot(), "breaker after outage");

    tokio::time::sleep(Duration::from_millis(500)).await;

    let healthy = FlakyOperation::new(0, Failure::new("connection", "refused"), 21u32);
    match inventory.execute(|| healthy.call_async()).await {
        Ok(stock) => tracing::info!(stock, "recovered"),
        Err(e) => tracing::error!("still failing: {}", e),
    }
}
