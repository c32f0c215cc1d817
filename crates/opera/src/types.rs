//! Request/response types for the OPERA Cloud statistics API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use hfcheck_core::DateWindow;

/// Bearer token returned by the token endpoint. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Location of a server-side asynchronous job (pending or finished).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub location: String,
}

impl JobHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// Outcome of one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Job finished; the result is at this location.
    Ready(JobHandle),
    /// Still running (200, 202 or 404).
    Pending,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

/// Body of the job submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsJobRequest {
    pub date_range_start: String,
    pub date_range_end: String,
    pub room_types: Vec<String>,
}

impl StatisticsJobRequest {
    /// All room types (the API expects a single empty string for that).
    pub fn for_window(window: &DateWindow) -> Self {
        Self {
            date_range_start: format_date(window.start),
            date_range_end: format_date(window.end),
            room_types: vec![String::new()],
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
