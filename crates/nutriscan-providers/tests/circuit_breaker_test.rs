// ABOUTME: Circuit breaker state transitions driven through the async call wrapper
// ABOUTME: Only transient adapter failures trip the breaker; probes close or re-open it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use nutriscan_core::{ProviderId, RawNutritionRecord};
use nutriscan_providers::{
    AdapterError, AdapterErrorKind, AdapterResult, CircuitBreaker, CircuitBreakerConfig,
    CircuitState,
};
use std::time::Duration;

fn breaker(threshold: u32, recovery: Duration) -> CircuitBreaker {
    CircuitBreaker::with_config(
        ProviderId::from("usda"),
        CircuitBreakerConfig::new(threshold, recovery, 1),
    )
}

async fn fail(kind: AdapterErrorKind) -> AdapterResult<RawNutritionRecord> {
    Err(AdapterError::new("usda", kind, "boom"))
}

async fn succeed() -> AdapterResult<RawNutritionRecord> {
    Ok(RawNutritionRecord::new("usda", "Apple"))
}

#[tokio::test]
async fn test_transient_failures_open_circuit() {
    let cb = breaker(3, Duration::from_secs(60));

    for _ in 0..3 {
        let err = cb.call(fail(AdapterErrorKind::Timeout)).await.unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::Timeout);
    }
    assert_eq!(cb.state(), CircuitState::Open);

    let err = cb.call(succeed()).await.unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::CircuitOpen);
}

#[tokio::test]
async fn test_not_found_does_not_count() {
    let cb = breaker(2, Duration::from_secs(60));

    for _ in 0..5 {
        let _ = cb.call(fail(AdapterErrorKind::NotFound)).await;
        let _ = cb.call(fail(AdapterErrorKind::Malformed)).await;
    }
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let cb = breaker(3, Duration::from_secs(60));

    let _ = cb.call(fail(AdapterErrorKind::NetworkError)).await;
    let _ = cb.call(fail(AdapterErrorKind::NetworkError)).await;
    assert!(cb.call(succeed()).await.is_ok());
    let _ = cb.call(fail(AdapterErrorKind::NetworkError)).await;

    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn test_probe_success_closes_circuit() {
    let cb = breaker(1, Duration::from_millis(20));
    let _ = cb.call(fail(AdapterErrorKind::Timeout)).await;
    assert_eq!(cb.state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(40)).await;

    assert!(cb.call(succeed()).await.is_ok());
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_probe_failure_reopens_circuit() {
    let cb = breaker(1, Duration::from_millis(20));
    let _ = cb.call(fail(AdapterErrorKind::Timeout)).await;

    tokio::time::sleep(Duration::from_millis(40)).await;

    let err = cb.call(fail(AdapterErrorKind::NetworkError)).await.unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::NetworkError);
    assert_eq!(cb.state(), CircuitState::Open);
    assert!(!cb.try_acquire());
}

#[tokio::test]
async fn test_reset_closes_open_circuit() {
    let cb = breaker(1, Duration::from_secs(60));
    let _ = cb.call(fail(AdapterErrorKind::Timeout)).await;
    assert_eq!(cb.state(), CircuitState::Open);

    cb.reset();
    assert_eq!(cb.state(), CircuitState::Closed);
    assert!(cb.call(succeed()).await.is_ok());
}

#[tokio::test]
async fn test_cancelled_probe_leaves_circuit_open() {
    let cb = breaker(1, Duration::ZERO);
    let _ = cb.call(fail(AdapterErrorKind::Timeout)).await;
    assert_eq!(cb.state(), CircuitState::Open);

    let err = cb.call(fail(AdapterErrorKind::Cancelled)).await.unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::Cancelled);
    assert_eq!(cb.state(), CircuitState::Open);

    // The released probe slot is immediately available again
    assert!(cb.call(succeed()).await.is_ok());
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_cancelled_probe_is_released_before_recovery_timeout() {
    let cb = breaker(1, Duration::from_millis(20));
    let _ = cb.call(fail(AdapterErrorKind::Timeout)).await;

    tokio::time::sleep(Duration::from_millis(40)).await;

    let _ = cb.call(fail(AdapterErrorKind::Cancelled)).await;
    assert_eq!(cb.state(), CircuitState::Open);
    assert!(cb.try_acquire());
    assert_eq!(cb.state(), CircuitState::HalfOpen);
}

#[tokio::test]
async fn test_not_found_probe_closes_circuit() {
    let cb = breaker(1, Duration::ZERO);
    let _ = cb.call(fail(AdapterErrorKind::Timeout)).await;

    let _ = cb.call(fail(AdapterErrorKind::NotFound)).await;
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_cancelled_call_while_closed_changes_nothing() {
    let cb = breaker(2, Duration::from_secs(60));
    let _ = cb.call(fail(AdapterErrorKind::Timeout)).await;
    let _ = cb.call(fail(AdapterErrorKind::Cancelled)).await;

    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.snapshot().consecutive_failures, 1);
}
