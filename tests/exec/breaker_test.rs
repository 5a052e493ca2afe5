//! Circuit breaker state machine under simulated time.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use scry::exec::{BreakerConfig, CircuitBreaker, CircuitState};

fn breaker(threshold: u32, recovery_secs: u64) -> CircuitBreaker {
    CircuitBreaker::new(BreakerConfig {
        failure_threshold: threshold,
        recovery_timeout: Duration::from_secs(recovery_secs),
    })
}

#[tokio::test(start_paused = true)]
async fn test_failures_below_threshold_keep_the_circuit_closed() {
    let breaker = CircuitBreaker::default();
    for _ in 0..4 {
        breaker.try_acquire().unwrap();
        breaker.record_failure();
    }
    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 4);
    breaker.try_acquire().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reaching_the_threshold_opens_the_circuit() {
    let breaker = CircuitBreaker::default();
    for _ in 0..5 {
        breaker.record_failure();
    }
    assert_eq!(breaker.snapshot().state, CircuitState::Open);

    let rejection = breaker.try_acquire().unwrap_err();
    assert!(rejection.retry_in > Duration::ZERO);
    assert!(rejection.retry_in <= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_open_circuit_rejects_until_recovery_elapses() {
    let breaker = breaker(1, 10);
    breaker.record_failure();
    assert_eq!(breaker.snapshot().state, CircuitState::Open);

    tokio::time::advance(Duration::from_secs(9)).await;
    let rejection = breaker.try_acquire().unwrap_err();
    assert!(rejection.retry_in <= Duration::from_secs(1));

    tokio::time::advance(Duration::from_secs(2)).await;
    breaker.try_acquire().expect("probe should be admitted after recovery");
    assert_eq!(breaker.snapshot().state, CircuitState::HalfOpen);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_admits_exactly_one_probe() {
    let breaker = breaker(1, 5);
    breaker.record_failure();
    tokio::time::advance(Duration::from_secs(6)).await;

    breaker.try_acquire().expect("first probe admitted");
    let rejection = breaker.try_acquire().unwrap_err();
    assert_eq!(rejection.retry_in, Duration::ZERO, "probe already in flight");
}

#[tokio::test(start_paused = true)]
async fn test_probe_success_closes_and_resets() {
    let breaker = breaker(2, 5);
    breaker.record_failure();
    breaker.record_failure();
    tokio::time::advance(Duration::from_secs(6)).await;

    breaker.try_acquire().unwrap();
    breaker.record_success();

    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
    // The circuit serves normally again.
    breaker.try_acquire().unwrap();
    breaker.try_acquire().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_probe_failure_reopens_with_a_fresh_timer() {
    let breaker = breaker(1, 10);
    breaker.record_failure();
    tokio::time::advance(Duration::from_secs(11)).await;

    breaker.try_acquire().expect("probe admitted");
    breaker.record_failure();
    assert_eq!(breaker.snapshot().state, CircuitState::Open);

    // The recovery window restarts from the probe failure.
    tokio::time::advance(Duration::from_secs(9)).await;
    breaker.try_acquire().unwrap_err();
    tokio::time::advance(Duration::from_secs(2)).await;
    breaker.try_acquire().expect("second probe after a full fresh window");
}

#[tokio::test(start_paused = true)]
async fn test_success_resets_the_consecutive_count() {
    let breaker = CircuitBreaker::default();
    for _ in 0..3 {
        breaker.record_failure();
    }
    breaker.record_success();
    assert_eq!(breaker.snapshot().consecutive_failures, 0);

    // The threshold counts from scratch after a success.
    for _ in 0..4 {
        breaker.record_failure();
    }
    assert_eq!(breaker.snapshot().state, CircuitState::Closed);
    breaker.record_failure();
    assert_eq!(breaker.snapshot().state, CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_acquires_admit_one_probe() {
    let breaker = Arc::new(breaker(1, 5));
    breaker.record_failure();
    tokio::time::advance(Duration::from_secs(6)).await;

    let attempts = (0..8).map(|_| {
        let breaker = Arc::clone(&breaker);
        tokio::spawn(async move { breaker.try_acquire() })
    });
    let outcomes = join_all(attempts).await;

    let admitted = outcomes
        .into_iter()
        .map(|joined| joined.expect("acquire task should not panic"))
        .filter(Result::is_ok)
        .count();
    assert_eq!(admitted, 1, "exactly one probe may pass the half-open gate");
}
