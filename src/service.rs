// src/service.rs
//! The service façade: one call from descriptor to shaped rows.

use std::sync::Arc;

use tracing::debug;

use crate::compiler::QueryCompiler;
use crate::descriptor::QueryDescriptor;
use crate::exec::{
    CircuitBreaker, OutcomeStatus, QueryEndpoint, QueryExecutor, QueryOutcome, RetryPolicy,
};
use crate::postprocess;
use crate::roles::Role;

// ============================================================================
// Service
// ============================================================================

/// Wires registry, compiler, renderer, executor, and post-processor behind
/// a single entry point.
///
/// `run` never fails: compilation always produces a query, and every
/// execution failure maps to an outcome status.
pub struct AnalyticsService<E> {
    compiler: QueryCompiler,
    executor: QueryExecutor<E>,
}

impl<E: QueryEndpoint> AnalyticsService<E> {
    /// Service over the built-in schema registry with default resilience
    /// settings.
    pub fn new(endpoint: E) -> Self {
        Self {
            compiler: QueryCompiler::builtin(),
            executor: QueryExecutor::new(endpoint),
        }
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_compiler(mut self, compiler: QueryCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.executor = self.executor.with_breaker(breaker);
        self
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.executor = self.executor.with_retry(retry);
        self
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        self.executor.breaker()
    }

    /// Compile and execute one request.
    ///
    /// `role_name` parses fail-secure: absent or unrecognized names run as
    /// the least-privileged role. `caller_id` feeds personalization and
    /// per-user access predicates.
    pub async fn run(
        &self,
        descriptor: &QueryDescriptor,
        role_name: Option<&str>,
        caller_id: Option<&str>,
    ) -> QueryOutcome {
        let role = Role::parse(role_name);
        let compiled = self.compiler.compile(descriptor, role, caller_id);
        let mut outcome = self.executor.execute(&compiled, role).await;
        if outcome.status == OutcomeStatus::Ok {
            let rows = std::mem::take(&mut outcome.rows);
            let processed = postprocess::process(rows, role);
            if !processed.meaningful {
                debug!("result set carries no meaningful data");
                outcome.status = OutcomeStatus::NoData;
            }
            outcome.row_count = processed.rows.len();
            outcome.rows = processed.rows;
        }
        outcome
    }
}

// ============================================================================
// Tests
// ============================================================================
