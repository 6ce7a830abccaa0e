//! Retry policy — pure decision function over classified send errors.
//!
//! The bounded retry loop lives in the orchestrator; keeping the decision
//! stateless makes `max_attempts` and the backoff testable in isolation.

use std::time::Duration;

use crate::error::SendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then retry the same unit.
    Wait(Duration),
    /// Give up on this unit for the current sweep.
    Abandon,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per delivery unit.
    pub max_attempts: u32,
    /// Safety margin added on top of the sink-specified throttle wait.
    pub throttle_margin: Duration,
    /// Fixed backoff for transient failures.
    pub transient_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            throttle_margin: Duration::from_secs(1),
            transient_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed
    /// with `error`.
    pub fn decide(&self, error: &SendError, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::Abandon;
        }
        match error {
            SendError::Throttled { retry_after } => {
                RetryDecision::Wait(*retry_after + self.throttle_margin)
            }
            SendError::TransientTimeout(_) => RetryDecision::Wait(self.transient_backoff),
            // Content the sink refuses will not become acceptable on an
            // immediate retry.
            SendError::PermanentRejected { .. } => RetryDecision::Abandon,
        }
    }
}
