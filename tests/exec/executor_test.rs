//! Executor behavior: retries, breaker coupling, failure statuses.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use scry::compiler::params::ParamMap;
use scry::compiler::{CompiledQuery, QueryCompiler};
use scry::descriptor::{Intent, QueryDescriptor};
use scry::exec::{
    BreakerConfig, CircuitBreaker, CircuitState, EndpointError, FixtureEndpoint, OutcomeStatus,
    QueryExecutor, RetryPolicy,
};
use scry::roles::Role;

fn compiled_report() -> CompiledQuery {
    let d = QueryDescriptor::new(Intent::Report).with_entities(&["projects"]);
    QueryCompiler::builtin().compile(&d, Role::Admin, None)
}

fn raw(sql: &str) -> CompiledQuery {
    CompiledQuery {
        sql_template: sql.to_string(),
        parameters: ParamMap::new(),
    }
}

fn unavailable() -> EndpointError {
    EndpointError::Unavailable("connection refused".into())
}

#[tokio::test]
async fn test_successful_execution_returns_rows() {
    let endpoint = Arc::new(FixtureEndpoint::returning(vec![
        json!({"project_name": "Alpha"}),
        json!({"project_name": "Beta"}),
    ]));
    let executor = QueryExecutor::new(Arc::clone(&endpoint));

    let outcome = executor.execute(&compiled_report(), Role::Admin).await;
    assert_eq!(outcome.status, OutcomeStatus::Ok);
    assert_eq!(outcome.row_count, 2);
    assert!(outcome.sql.starts_with("SELECT"));
    assert_eq!(endpoint.calls(), 1);
    assert_eq!(executor.breaker().snapshot().state, CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_back_off_and_recover() {
    let endpoint = Arc::new(FixtureEndpoint::scripted([
        Err(unavailable()),
        Err(EndpointError::Timeout(Duration::from_secs(30))),
        Ok(vec![json!({"project_name": "Alpha"})]),
    ]));
    let executor = QueryExecutor::new(Arc::clone(&endpoint));

    let started = tokio::time::Instant::now();
    let outcome = executor.execute(&compiled_report(), Role::Admin).await;

    assert_eq!(outcome.status, OutcomeStatus::Ok);
    assert_eq!(endpoint.calls(), 3);
    // 1s after the first failure, 2s after the second.
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(executor.breaker().snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn test_rejections_are_not_retried() {
    let endpoint = Arc::new(FixtureEndpoint::scripted([Err(EndpointError::Rejected(
        "permission denied".into(),
    ))]));
    let executor = QueryExecutor::new(Arc::clone(&endpoint));

    let outcome = executor.execute(&compiled_report(), Role::Viewer).await;
    assert_eq!(outcome.status, OutcomeStatus::ExecutionFailed);
    assert_eq!(endpoint.calls(), 1, "a rejection fails the same way every time");
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_count_as_one_breaker_failure() {
    let endpoint = Arc::new(FixtureEndpoint::scripted([
        Err(unavailable()),
        Err(unavailable()),
        Err(unavailable()),
    ]));
    let executor = QueryExecutor::new(Arc::clone(&endpoint));

    let outcome = executor.execute(&compiled_report(), Role::Admin).await;
    assert_eq!(outcome.status, OutcomeStatus::ExecutionFailed);
    assert_eq!(endpoint.calls(), 3, "default policy allows three attempts");

    let snapshot = executor.breaker().snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(
        snapshot.consecutive_failures, 1,
        "retries within one execution record a single failure"
    );
}

#[tokio::test]
async fn test_breaker_opens_after_repeated_failed_executions() {
    let failures = (0..5).map(|_| Err(unavailable()));
    let endpoint = Arc::new(FixtureEndpoint::scripted(failures));
    let executor = QueryExecutor::new(Arc::clone(&endpoint)).with_retry(RetryPolicy::none());
    let compiled = compiled_report();

    for run in 0..5 {
        let outcome = executor.execute(&compiled, Role::Admin).await;
        assert_eq!(outcome.status, OutcomeStatus::ExecutionFailed, "run {run}");
    }
    assert_eq!(executor.breaker().snapshot().state, CircuitState::Open);

    let outcome = executor.execute(&compiled, Role::Admin).await;
    assert_eq!(outcome.status, OutcomeStatus::CircuitOpen);
    assert_eq!(endpoint.calls(), 5, "an open circuit never reaches the endpoint");
}

#[tokio::test]
async fn test_open_circuit_short_circuits_immediately() {
    let endpoint = Arc::new(FixtureEndpoint::empty());
    let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
        failure_threshold: 1,
        recovery_timeout: Duration::from_secs(60),
    }));
    breaker.record_failure();

    let executor =
        QueryExecutor::new(Arc::clone(&endpoint)).with_breaker(Arc::clone(&breaker));
    let outcome = executor.execute(&compiled_report(), Role::Admin).await;

    assert_eq!(outcome.status, OutcomeStatus::CircuitOpen);
    assert_eq!(endpoint.calls(), 0);
    assert!(!outcome.sql.is_empty(), "the rendered statement is still reported");
}

#[tokio::test]
async fn test_non_select_is_rejected_before_the_endpoint() {
    let endpoint = Arc::new(FixtureEndpoint::empty());
    let executor = QueryExecutor::new(Arc::clone(&endpoint));

    for statement in ["DELETE FROM projects", "SELECT 1; DROP TABLE projects"] {
        let outcome = executor.execute(&raw(statement), Role::Admin).await;
        assert_eq!(outcome.status, OutcomeStatus::NonSelectRejected, "{statement}");
    }
    assert_eq!(endpoint.calls(), 0);
    // Gate rejections say nothing about endpoint health.
    assert_eq!(executor.breaker().snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn test_render_failure_maps_to_execution_failed() {
    let endpoint = Arc::new(FixtureEndpoint::empty());
    let executor = QueryExecutor::new(Arc::clone(&endpoint));

    let outcome = executor
        .execute(&raw("SELECT 1 WHERE x = :ghost"), Role::Admin)
        .await;
    assert_eq!(outcome.status, OutcomeStatus::ExecutionFailed);
    assert!(outcome.sql.is_empty(), "nothing rendered, nothing to report");
    assert_eq!(endpoint.calls(), 0);
}

#[tokio::test]
async fn test_empty_result_is_still_a_successful_execution() {
    let endpoint = Arc::new(FixtureEndpoint::empty());
    let executor = QueryExecutor::new(Arc::clone(&endpoint));

    let outcome = executor.execute(&compiled_report(), Role::Admin).await;
    assert_eq!(outcome.status, OutcomeStatus::Ok);
    assert_eq!(outcome.row_count, 0);
    assert!(outcome.is_ok());
}
