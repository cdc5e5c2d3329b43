//! Linear retry backoff.
//!
//! With `n` retries already spent, the next one waits `(n + 1) * unit`.
//! A failure once the budget is spent resets the counter and gives up.

use std::time::Duration;

/// What to do after a failed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule one retry.
    Retry {
        /// Retry number, starting at 1.
        attempt: u32,
        /// Delay before the retry.
        delay: Duration,
    },
    /// Retry budget exhausted; the counter was reset.
    GiveUp,
}

/// Linear backoff state.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    unit: Duration,
    max_retries: u32,
    retry_count: u32,
}

impl LinearBackoff {
    /// Create a backoff with the given delay unit and retry budget.
    pub fn new(unit: Duration, max_retries: u32) -> Self {
        Self {
            unit,
            max_retries,
            retry_count: 0,
        }
    }

    /// Retries spent since the last success or give-up.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Delay unit (the poll interval).
    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Change the delay unit; keeps the failure count.
    pub fn set_unit(&mut self, unit: Duration) {
        self.unit = unit;
    }

    /// Delay before the `attempt`-th retry.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt)
    }

    /// Record a failure and decide what to do.
    pub fn record_failure(&mut self) -> RetryDecision {
        if self.retry_count < self.max_retries {
            self.retry_count += 1;
            RetryDecision::Retry {
                attempt: self.retry_count,
                delay: self.delay_for(self.retry_count),
            }
        } else {
            self.retry_count = 0;
            RetryDecision::GiveUp
        }
    }

    /// Record a success.
    pub fn record_success(&mut self) {
        self.retry_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Duration = Duration::from_millis(1000);

    #[test]
    fn test_linear_delays() {
        let backoff = LinearBackoff::new(UNIT, 3);
        assert_eq!(backoff.delay_for(1), UNIT);
        assert_eq!(backoff.delay_for(2), UNIT * 2);
        assert_eq!(backoff.delay_for(3), UNIT * 3);
    }

    #[test]
    fn test_three_retries_then_give_up() {
        let mut backoff = LinearBackoff::new(UNIT, 3);
        assert_eq!(
            backoff.record_failure(),
            RetryDecision::Retry { attempt: 1, delay: UNIT }
        );
        assert_eq!(
            backoff.record_failure(),
            RetryDecision::Retry { attempt: 2, delay: UNIT * 2 }
        );
        assert_eq!(
            backoff.record_failure(),
            RetryDecision::Retry { attempt: 3, delay: UNIT * 3 }
        );
        assert_eq!(backoff.retry_count(), 3);
        assert_eq!(backoff.record_failure(), RetryDecision::GiveUp);
        assert_eq!(backoff.retry_count(), 0);
    }

    #[test]
    fn test_larger_budget_keeps_growing() {
        let mut backoff = LinearBackoff::new(UNIT, 4);
        let delays: Vec<_> = (0..4)
            .map(|_| match backoff.record_failure() {
                RetryDecision::Retry { delay, .. } => delay,
                RetryDecision::GiveUp => Duration::ZERO,
            })
            .collect();
        assert_eq!(delays, vec![UNIT, UNIT * 2, UNIT * 3, UNIT * 4]);
        assert_eq!(backoff.record_failure(), RetryDecision::GiveUp);
    }

    #[test]
    fn test_success_resets() {
        let mut backoff = LinearBackoff::new(UNIT, 3);
        backoff.record_failure();
        backoff.record_failure();
        backoff.record_success();
        assert_eq!(backoff.retry_count(), 0);
        assert!(matches!(backoff.record_failure(), RetryDecision::Retry { attempt: 1, .. }));
    }

    #[test]
    fn test_single_retry_budget() {
        let mut backoff = LinearBackoff::new(UNIT, 1);
        assert_eq!(
            backoff.record_failure(),
            RetryDecision::Retry { attempt: 1, delay: UNIT }
        );
        assert_eq!(backoff.record_failure(), RetryDecision::GiveUp);
    }
}
