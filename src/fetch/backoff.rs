//! Rate-limit and backoff policy.
//!
//! The engine fetches one unit at a time on purpose: the fixed sleeps here
//! are a politeness constraint toward archive hosts, not a throughput
//! mechanism. The policy is a trait so an adaptive strategy can replace the
//! fixed delays without touching lexer or aggregator code.

use std::time::Duration;

/// Pauses the aggregators observe between unit fetches.
pub trait BackoffPolicy {
    /// Pause after every successful unit fetch.
    fn after_unit(&self) -> Duration;

    /// Pause after a recoverable unit-fetch failure, before moving on to
    /// the next unit.
    fn after_failure(&self) -> Duration;
}

/// Fixed, non-adaptive delays: 1 second between units, 30 seconds after a
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBackoff {
    pub unit_pause: Duration,
    pub failure_delay: Duration,
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self {
            unit_pause: Duration::from_secs(1),
            failure_delay: Duration::from_secs(30),
        }
    }
}

impl FixedBackoff {
    /// Zero delays, for tests and local-file scrapes.
    pub fn none() -> Self {
        Self {
            unit_pause: Duration::ZERO,
            failure_delay: Duration::ZERO,
        }
    }
}

impl BackoffPolicy for FixedBackoff {
    fn after_unit(&self) -> Duration {
        self.unit_pause
    }

    fn after_failure(&self) -> Duration {
        self.failure_delay
    }
}
