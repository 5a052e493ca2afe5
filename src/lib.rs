//! # Scry
//!
//! An analytics query compiler with a resilient execution layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              QueryDescriptor (structured request)        │
//! │  (intent, entities, filters, metrics, role, caller)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compiler: strategy per intent]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL template + named parameters                   │
//! │  (filters, personalization, and RBAC injected)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [renderer]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Executable SELECT (typed literals inlined)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor: gate → breaker → retry]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Rows from the endpoint                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [post-processor]
//! ┌─────────────────────────────────────────────────────────┐
//! │     QueryOutcome (unwrapped, redacted, status-tagged)    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Compilation never fails: unknown entities, unresolved joins, and missing
//! columns degrade to documented fallbacks. Execution never panics: every
//! failure converges to an outcome status.

pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod exec;
pub mod postprocess;
pub mod render;
pub mod roles;
pub mod schema;
pub mod service;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compiler::{CompiledQuery, QueryCompiler};
    pub use crate::descriptor::{
        ChartKind, DateRange, Filters, Intent, QueryDescriptor, SortDir,
    };
    pub use crate::exec::{
        BreakerConfig, CircuitBreaker, CircuitState, EndpointError, FixtureEndpoint,
        OutcomeStatus, QueryEndpoint, QueryExecutor, QueryOutcome, RetryPolicy,
    };
    pub use crate::roles::{Role, REDACTION_SENTINEL};
    pub use crate::schema::{EntitySchema, SchemaRegistry};
    pub use crate::service::AnalyticsService;
}

// Also export at crate root for convenience
pub use compiler::{CompiledQuery, QueryCompiler};
pub use descriptor::{Intent, QueryDescriptor};
pub use exec::{OutcomeStatus, QueryOutcome};
pub use roles::Role;
pub use schema::SchemaRegistry;
pub use service::AnalyticsService;
