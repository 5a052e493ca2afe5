// src/exec/executor.rs
//! The execution pipeline: render, gate, admit, retry.

use std::sync::Arc;

use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::compiler::CompiledQuery;
use crate::render;
use crate::roles::Role;
use crate::sql;

use super::breaker::CircuitBreaker;
use super::endpoint::QueryEndpoint;
use super::retry::RetryPolicy;
use super::{OutcomeStatus, QueryOutcome};

// ============================================================================
// Executor
// ============================================================================

/// Runs compiled queries against an endpoint, guarded by a shared circuit
/// breaker and a bounded retry policy.
///
/// The breaker sees one verdict per admitted execution: success, or failure
/// after retries are exhausted. Breaker rejections never count as attempts.
pub struct QueryExecutor<E> {
    endpoint: E,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl<E: QueryEndpoint> QueryExecutor<E> {
    pub fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            breaker: Arc::new(CircuitBreaker::default()),
            retry: RetryPolicy::default(),
        }
    }

    /// Share a breaker across executors hitting the same backend.
    #[must_use = "builders have no effect until used"]
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Execute one compiled query. Never panics and never returns an error:
    /// every failure mode maps to a [`QueryOutcome`] status.
    pub async fn execute(&self, compiled: &CompiledQuery, role: Role) -> QueryOutcome {
        let execution_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "execute_query",
            execution_id = %execution_id,
            role = %role,
        );
        self.execute_inner(compiled, role).instrument(span).await
    }

    async fn execute_inner(&self, compiled: &CompiledQuery, role: Role) -> QueryOutcome {
        let sql = match render::render(compiled) {
            Ok(sql) => sql,
            Err(error) => {
                warn!(%error, "parameter substitution failed");
                return QueryOutcome::failure(OutcomeStatus::ExecutionFailed, String::new());
            }
        };

        if let Err(error) = sql::ensure_select(&sql) {
            warn!(%error, "statement rejected before execution");
            return QueryOutcome::failure(OutcomeStatus::NonSelectRejected, sql);
        }

        if let Err(rejection) = self.breaker.try_acquire() {
            warn!(%rejection, "short-circuited");
            return QueryOutcome::failure(OutcomeStatus::CircuitOpen, sql);
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.endpoint.execute(&sql, role.as_str()).await {
                Ok(rows) => {
                    self.breaker.record_success();
                    info!(attempt, rows = rows.len(), "query executed");
                    return QueryOutcome::success(rows, sql);
                }
                Err(error) if error.is_retriable() && attempt < self.retry.attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(%error, attempt, ?delay, "attempt failed, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    self.breaker.record_failure();
                    warn!(%error, attempt, "execution failed");
                    return QueryOutcome::failure(OutcomeStatus::ExecutionFailed, sql);
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
