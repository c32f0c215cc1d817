use std::time::Duration;

use hfcheck_core::DEFAULT_MAX_WINDOW_DAYS;
use hfcheck_opera::{
    PollPolicy, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_MAX_INTERVAL_SECS,
    DEFAULT_POLL_MAX_WAIT_SECS,
};

pub struct Config {
    pub max_window_days: u32,
    pub poll: PollPolicy,
    pub request_timeout: Duration,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Unset, unparseable or
    /// zero values fall back to their defaults.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let positive = |key: &str| -> Option<u64> {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .filter(|n: &u64| *n > 0)
        };

        let max_window_days = lookup("HFC_MAX_WINDOW_DAYS")
            .and_then(|v| v.trim().parse().ok())
            .filter(|days| *days > 0)
            .unwrap_or(DEFAULT_MAX_WINDOW_DAYS);

        // The cap goes first so that a longer initial interval can raise it.
        let mut poll = PollPolicy::default()
            .with_max_interval(Duration::from_secs(
                positive("HFC_POLL_MAX_INTERVAL_SECS").unwrap_or(DEFAULT_POLL_MAX_INTERVAL_SECS),
            ))
            .with_initial_interval(Duration::from_secs(
                positive("HFC_POLL_INTERVAL_SECS").unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ))
            .with_max_wait(Duration::from_secs(
                positive("HFC_POLL_MAX_WAIT_SECS").unwrap_or(DEFAULT_POLL_MAX_WAIT_SECS),
            ));
        if let Some(attempts) = lookup("HFC_POLL_MAX_ATTEMPTS").and_then(|v| v.trim().parse().ok())
        {
            poll = poll.with_max_attempts(attempts);
        }

        let timeout_ms = positive("HFC_REQUEST_TIMEOUT_MS").unwrap_or(30_000);
        let log_format = lookup("HFC_LOG_FORMAT").unwrap_or_else(|| "text".to_string());

        Self {
            max_window_days,
            poll,
            request_timeout: Duration::from_millis(timeout_ms),
            log_format,
        }
    }
}
