//! Polling and retry bounds for the job orchestrator.

use std::time::Duration;

/// Initial delay between readiness polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Ceiling for the growing poll delay.
pub const DEFAULT_POLL_MAX_INTERVAL_SECS: u64 = 60;

/// Total time a single job may take before its window is given up.
pub const DEFAULT_POLL_MAX_WAIT_SECS: u64 = 30 * 60;

/// How long and how often to poll a pending job.
///
/// The delay starts at `initial_interval`, is multiplied by `multiplier` after
/// each pending poll and never exceeds the larger of `max_interval` and
/// `initial_interval`. Polling stops with a timeout once `max_attempts` polls
/// were made or the next sleep would pass `max_wait`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub max_attempts: Option<u32>,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            multiplier: 1.5,
            max_interval: Duration::from_secs(DEFAULT_POLL_MAX_INTERVAL_SECS),
            max_attempts: None,
            max_wait: Duration::from_secs(DEFAULT_POLL_MAX_WAIT_SECS),
        }
    }
}

impl PollPolicy {
    /// Constant delay between polls.
    #[must_use]
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            multiplier: 1.0,
            max_interval: interval,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self.max_interval = self.max_interval.max(interval);
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn with_max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = wait;
        self
    }

    /// Delay to use after `current`.
    ///
    /// Never shorter than `initial_interval`, even when `max_interval` was
    /// set below it.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let multiplier = if self.multiplier.is_finite() {
            self.multiplier.max(1.0)
        } else {
            1.0
        };
        let cap = self.max_interval.max(self.initial_interval);
        let next_secs = current.as_secs_f64() * multiplier;
        if next_secs >= cap.as_secs_f64() {
            return cap;
        }
        Duration::from_secs_f64(next_secs)
    }

    /// Whether another poll may be scheduled.
    pub(crate) fn allows(&self, attempts: u32, waited: Duration, next_delay: Duration) -> bool {
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return false;
        }
        waited.saturating_add(next_delay) <= self.max_wait
    }
}

/// Retries for transport failures (connect errors, timeouts) on one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Disable retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(16) as i32);
        self.initial_backoff.mul_f64(factor)
    }
}
