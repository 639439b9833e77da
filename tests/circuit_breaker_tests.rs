use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use anyhow::{Result, anyhow};
use tokio::time::{Duration, sleep};
use valuation_service::{
    clients::circuit_breaker::{BreakerError, CircuitBreaker, with_fallback},
    models::circuit_breaker::{CircuitBreakerConfig, CircuitState},
};

fn breaker(failure_threshold_percentage: u32, reset_timeout_ms: u64) -> CircuitBreaker {
    CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold_percentage,
        reset_timeout_ms,
    })
}

/// Test: A new breaker starts closed with zeroed counters
#[tokio::test]
async fn test_initial_state_is_closed() -> Result<()> {
    let cb = breaker(50, 1_000);

    assert_eq!(cb.state(), CircuitState::Closed);
    assert!(cb.is_closed());
    assert!(!cb.is_open());
    assert_eq!(cb.total_count(), 0);
    assert_eq!(cb.failure_count(), 0);

    Ok(())
}

/// Test: Successful calls return the value and never trip the breaker
#[tokio::test]
async fn test_successes_keep_breaker_closed() -> Result<()> {
    let cb = breaker(50, 1_000);

    for i in 0..5 {
        let value = cb.run(|| async move { Ok(i) }, None).await?;
        assert_eq!(value, i);
    }

    assert!(cb.is_closed());
    assert_eq!(cb.total_count(), 5);
    assert_eq!(cb.failure_count(), 0);

    Ok(())
}

/// Test: Primary success is returned without touching a provided fallback
#[tokio::test]
async fn test_fallback_not_invoked_on_success() -> Result<()> {
    let cb = breaker(50, 1_000);

    let fallback_calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fallback_calls);

    let value = cb
        .run(
            || async { Ok(1) },
            with_fallback(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(2) }
            }),
        )
        .await?;

    assert_eq!(value, 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

/// Test: Fallback result is returned when the primary fails
#[tokio::test]
async fn test_fallback_invoked_on_primary_failure() -> Result<()> {
    let cb = breaker(50, 1_000);

    let value = cb
        .run(
            || async { Err::<i32, _>(anyhow!("primary down")) },
            with_fallback(|| async { Ok(1) }),
        )
        .await?;

    assert_eq!(value, 1);
    assert_eq!(cb.total_count(), 1);
    assert_eq!(cb.failure_count(), 1);

    Ok(())
}

/// Test: Without a fallback, the primary failure propagates as-is
#[tokio::test]
async fn test_primary_failure_propagates_without_fallback() -> Result<()> {
    let cb = breaker(50, 1_000);

    let err = cb
        .run(|| async { Err::<i32, _>(anyhow!("primary down")) }, None)
        .await
        .unwrap_err();

    assert!(matches!(err, BreakerError::Primary(_)));
    assert!(err.to_string().contains("primary down"));

    Ok(())
}

/// Test: Breaker stays closed at exactly the threshold ratio, opens above it
#[tokio::test]
async fn test_threshold_is_strictly_greater_than() -> Result<()> {
    let cb = breaker(50, 1_000);

    // 1 success, 1 failure: ratio 0.5 is not > 0.5
    let value = cb.run(|| async { Ok(1) }, None).await?;
    assert_eq!(value, 1);

    let result = cb
        .run(|| async { Err::<i32, _>(anyhow!("boom")) }, None)
        .await;
    assert!(result.is_err());
    assert!(cb.is_closed());

    // Second failure: 2/3 > 0.5
    let result = cb
        .run(|| async { Err::<i32, _>(anyhow!("boom")) }, None)
        .await;
    assert!(result.is_err());
    assert!(cb.is_open());
    assert_eq!(cb.total_count(), 3);
    assert_eq!(cb.failure_count(), 2);

    Ok(())
}

/// Test: With a 49% threshold, a single failure after one success opens the circuit
#[tokio::test]
async fn test_low_threshold_opens_on_first_failure() -> Result<()> {
    let cb = breaker(49, 1_000);

    let value = cb.run(|| async { Ok(1) }, None).await?;
    assert_eq!(value, 1);
    assert!(cb.is_closed());

    let result = cb
        .run(|| async { Err::<i32, _>(anyhow!("boom")) }, None)
        .await;
    assert!(result.is_err());
    assert!(cb.is_open());

    Ok(())
}

/// Test: While open, the primary is never invoked and the fallback serves the call
#[tokio::test]
async fn test_open_circuit_skips_primary_and_uses_fallback() -> Result<()> {
    let cb = breaker(50, 1_000);
    cb.override_state(CircuitState::Open);

    let primary_calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&primary_calls);

    let value = cb
        .run(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(2) }
            },
            with_fallback(|| async { Ok(1) }),
        )
        .await?;

    assert_eq!(value, 1);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

/// Test: While open with no fallback, run fails fast with the open-circuit error
#[tokio::test]
async fn test_open_circuit_without_fallback_fails_fast() -> Result<()> {
    let cb = breaker(50, 1_000);
    cb.override_state(CircuitState::Open);

    let primary_calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&primary_calls);

    let err = cb
        .run(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(1) }
            },
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BreakerError::CircuitOpen));
    assert_eq!(
        err.to_string(),
        "Circuit is open and no fallback provided"
    );
    assert_eq!(primary_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

/// Test: Calls served by the fallback while open do not touch the counters
#[tokio::test]
async fn test_calls_while_open_are_not_counted() -> Result<()> {
    let cb = breaker(50, 60_000);

    // First failure opens: 1/1 > 0.5
    let value = cb
        .run(
            || async { Err::<i32, _>(anyhow!("boom")) },
            with_fallback(|| async { Ok(1) }),
        )
        .await?;
    assert_eq!(value, 1);
    assert!(cb.is_open());

    for _ in 0..3 {
        let value = cb
            .run(
                || async { Err::<i32, _>(anyhow!("boom")) },
                with_fallback(|| async { Ok(1) }),
            )
            .await?;
        assert_eq!(value, 1);
    }

    assert_eq!(cb.total_count(), 1);
    assert_eq!(cb.failure_count(), 1);

    Ok(())
}

/// Test: The circuit closes and counters zero once the reset timeout elapses
#[tokio::test(start_paused = true)]
async fn test_reset_timeout_closes_circuit_and_zeroes_counters() -> Result<()> {
    let cb = breaker(50, 2_000);

    let result = cb
        .run(|| async { Err::<i32, _>(anyhow!("boom")) }, None)
        .await;
    assert!(result.is_err());
    assert!(cb.is_open());

    sleep(Duration::from_millis(2_100)).await;

    assert!(cb.is_closed());
    assert_eq!(cb.total_count(), 0);
    assert_eq!(cb.failure_count(), 0);

    // A fresh failure sequence is required to reopen
    let value = cb.run(|| async { Ok(1) }, None).await?;
    assert_eq!(value, 1);
    assert!(cb.is_closed());
    assert_eq!(cb.total_count(), 1);
    assert_eq!(cb.failure_count(), 0);

    Ok(())
}

/// Test: Overriding the state cancels the pending reset, so counters survive the timeout
#[tokio::test(start_paused = true)]
async fn test_override_cancels_pending_reset() -> Result<()> {
    let cb = breaker(50, 2_000);

    let result = cb
        .run(|| async { Err::<i32, _>(anyhow!("boom")) }, None)
        .await;
    assert!(result.is_err());
    assert!(cb.is_open());
    assert_eq!(cb.failure_count(), 1);

    cb.override_state(CircuitState::Closed);
    assert!(cb.is_closed());

    sleep(Duration::from_millis(2_500)).await;

    assert!(cb.is_closed());
    assert_eq!(cb.total_count(), 1);
    assert_eq!(cb.failure_count(), 1);

    Ok(())
}

/// Test: override_state transitions immediately and leaves counters alone
#[tokio::test]
async fn test_override_state_preserves_counters() -> Result<()> {
    let cb = breaker(50, 1_000);

    let value = cb.run(|| async { Ok(1) }, None).await?;
    assert_eq!(value, 1);
    assert_eq!(cb.total_count(), 1);

    cb.override_state(CircuitState::Open);
    assert_eq!(cb.state(), CircuitState::Open);
    assert!(cb.is_open());
    assert!(!cb.is_closed());
    assert_eq!(cb.total_count(), 1);
    assert_eq!(cb.failure_count(), 0);

    cb.override_state(CircuitState::Closed);
    assert!(cb.is_closed());
    assert_eq!(cb.total_count(), 1);

    Ok(())
}

/// Test: Concurrent failing calls leave consistent counters and an open circuit
#[tokio::test]
async fn test_concurrent_failures_keep_counters_consistent() -> Result<()> {
    let cb = breaker(10, 60_000);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let cb = cb.clone();
        handles.push(tokio::spawn(async move {
            let _ = cb
                .run(
                    || async {
                        sleep(Duration::from_millis(10)).await;
                        Err::<i32, _>(anyhow!("boom"))
                    },
                    None,
                )
                .await;
        }));
    }

    for handle in handles {
        handle.await?;
    }

    assert!(cb.is_open());
    assert!(cb.failure_count() <= cb.total_count());
    assert!(cb.failure_count() >= 1);

    Ok(())
}

/// Test: Concrete scenario from the provider composition (threshold 50%, 1s reset)
#[tokio::test]
async fn test_run_scenario_matrix() -> Result<()> {
    let cb = breaker(50, 1_000);

    let value = cb.run(|| async { Ok(1) }, None).await?;
    assert_eq!(value, 1);
    assert!(cb.is_closed());

    let value = cb
        .run(
            || async { Err::<i32, _>(anyhow!("rejected")) },
            with_fallback(|| async { Ok(1) }),
        )
        .await?;
    assert_eq!(value, 1);

    let err = cb
        .run(|| async { Err::<i32, _>(anyhow!("rejected")) }, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("rejected"));

    Ok(())
}
