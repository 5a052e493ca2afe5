// src/exec/mod.rs
//! Resilient query execution.
//!
//! A rendered query passes a SELECT-only gate, then the circuit breaker,
//! then a bounded retry loop around the endpoint call. Every failure path
//! converges to a [`QueryOutcome`] carrying an empty row set and a status;
//! nothing in this module panics or escapes as an unhandled error.

pub mod breaker;
pub mod endpoint;
pub mod executor;
pub mod retry;

pub use breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker, CircuitOpen, CircuitState};
pub use endpoint::{EndpointError, FixtureEndpoint, QueryEndpoint};
pub use executor::QueryExecutor;
pub use retry::RetryPolicy;

use serde::Serialize;
use serde_json::Value;

/// Terminal status of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Rows came back and carry meaningful data.
    Ok,
    /// The query ran but produced nothing worth showing.
    NoData,
    /// The rendered statement was not a single SELECT.
    NonSelectRejected,
    /// The breaker short-circuited the call.
    CircuitOpen,
    /// The endpoint failed after retries.
    ExecutionFailed,
}

/// What one execution produced, success or not.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub rows: Vec<Value>,
    pub status: OutcomeStatus,
    pub sql: String,
    pub row_count: usize,
}

impl QueryOutcome {
    pub fn success(rows: Vec<Value>, sql: String) -> Self {
        let row_count = rows.len();
        Self {
            rows,
            status: OutcomeStatus::Ok,
            sql,
            row_count,
        }
    }

    pub fn failure(status: OutcomeStatus, sql: String) -> Self {
        Self {
            rows: Vec::new(),
            status,
            sql,
            row_count: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OutcomeStatus::Ok
    }
}
