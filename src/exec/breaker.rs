// src/exec/breaker.rs
//! Circuit breaker guarding the query endpoint.
//!
//! Closed counts consecutive failures; at the threshold the circuit opens
//! and rejects calls outright. Once the recovery timeout has elapsed since
//! the last failure the next caller is admitted as a single half-open
//! probe: its success closes the circuit, its failure reopens it with a
//! fresh timer.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::warn;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the circuit.
    pub failure_threshold: u32,
    /// How long after the last failure a probe is allowed through.
    pub recovery_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Rejection handed to callers while the circuit refuses traffic.
#[derive(Debug, Clone, Error)]
#[error("circuit open, retrying in {retry_in:?}")]
pub struct CircuitOpen {
    /// Time until the next probe is admitted. Zero while a probe is
    /// already in flight.
    pub retry_in: Duration,
}

/// Point-in-time view of the breaker, for logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    probe_inflight: bool,
}

// ============================================================================
// Breaker
// ============================================================================

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure: None,
                probe_inflight: false,
            }),
        }
    }

    /// A poisoned lock means a panic elsewhere, not corrupt breaker state;
    /// recover the guard rather than cascade the panic.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask to run one call. The open-to-half-open transition happens here,
    /// inside the critical section, so exactly one caller wins the probe.
    pub fn try_acquire(&self) -> Result<(), CircuitOpen> {
        let mut inner = self.lock();
        if inner.state == CircuitState::Open {
            let elapsed = inner
                .last_failure
                .map(|at| Instant::now().duration_since(at))
                .unwrap_or(self.config.recovery_timeout);
            if elapsed < self.config.recovery_timeout {
                return Err(CircuitOpen {
                    retry_in: self.config.recovery_timeout - elapsed,
                });
            }
            inner.state = CircuitState::HalfOpen;
            inner.probe_inflight = false;
        }
        if inner.state == CircuitState::HalfOpen {
            if inner.probe_inflight {
                return Err(CircuitOpen {
                    retry_in: Duration::ZERO,
                });
            }
            inner.probe_inflight = true;
        }
        Ok(())
    }

    /// Record the success of an admitted call.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            warn!("circuit closed after successful probe");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.last_failure = None;
        inner.probe_inflight = false;
    }

    /// Record the failure of an admitted call.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.last_failure = Some(Instant::now());
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Open;
            inner.probe_inflight = false;
            inner.consecutive_failures = 0;
            warn!("probe failed, circuit reopened");
            return;
        }
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        if inner.state == CircuitState::Closed
            && inner.consecutive_failures >= self.config.failure_threshold
        {
            inner.state = CircuitState::Open;
            inner.consecutive_failures = 0;
            warn!(
                threshold = self.config.failure_threshold,
                "failure threshold reached, circuit opened"
            );
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
