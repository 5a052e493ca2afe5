// src/exec/retry.rs
//! Retry policy with exponential backoff.

use std::time::Duration;

// ============================================================================
// Policy
// ============================================================================

/// Bounded retry schedule for transient endpoint failures.
///
/// Attempt `n` (1-based) that fails retriably waits
/// `min(base_delay * 2^(n-1), max_delay)` before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included.
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// No backoff at all, for tests and tools that want one shot.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Backoff after the given 1-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

// ============================================================================
// Tests
// ============================================================================
