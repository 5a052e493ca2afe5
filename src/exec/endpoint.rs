// src/exec/endpoint.rs
//! The boundary between the executor and whatever runs the SQL.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Trait
// ============================================================================

/// Anything that can run a rendered SELECT on behalf of a role and hand
/// back rows as JSON objects.
#[async_trait]
pub trait QueryEndpoint: Send + Sync {
    async fn execute(&self, sql: &str, role: &str) -> Result<Vec<Value>, EndpointError>;
}

/// Failure surfaced by an endpoint.
#[derive(Debug, Clone, Error)]
pub enum EndpointError {
    /// The backing service could not be reached.
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),
    /// The call exceeded its deadline.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    /// The endpoint refused the query outright.
    #[error("query rejected: {0}")]
    Rejected(String),
}

impl EndpointError {
    /// Retrying only makes sense for transient faults. A rejection will
    /// fail the same way every time.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, EndpointError::Rejected(_))
    }
}

#[async_trait]
impl<E: QueryEndpoint + ?Sized> QueryEndpoint for std::sync::Arc<E> {
    async fn execute(&self, sql: &str, role: &str) -> Result<Vec<Value>, EndpointError> {
        (**self).execute(sql, role).await
    }
}

// ============================================================================
// Fixture endpoint
// ============================================================================

/// In-memory endpoint for tests and offline runs.
///
/// Scripted outcomes are consumed in order; once the script is drained
/// every call answers with the fallback rows.
pub struct FixtureEndpoint {
    script: Mutex<VecDeque<Result<Vec<Value>, EndpointError>>>,
    fallback: Vec<Value>,
    calls: AtomicUsize,
}

impl FixtureEndpoint {
    /// Endpoint that always answers with the same rows.
    pub fn returning(rows: Vec<Value>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: rows,
            calls: AtomicUsize::new(0),
        }
    }

    /// Endpoint that always answers with zero rows.
    pub fn empty() -> Self {
        Self::returning(Vec::new())
    }

    /// Endpoint that plays back the given outcomes first.
    pub fn scripted(
        outcomes: impl IntoIterator<Item = Result<Vec<Value>, EndpointError>>,
    ) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            fallback: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Rows served once the script is exhausted.
    #[must_use = "builders have no effect until used"]
    pub fn with_fallback(mut self, rows: Vec<Value>) -> Self {
        self.fallback = rows;
        self
    }

    /// How many times `execute` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Result<Vec<Value>, EndpointError> {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[async_trait]
impl QueryEndpoint for FixtureEndpoint {
    async fn execute(&self, _sql: &str, _role: &str) -> Result<Vec<Value>, EndpointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.next_outcome()
    }
}

// ============================================================================
// Tests
// ============================================================================
