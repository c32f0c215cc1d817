//! Error types for the OPERA client crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for OPERA client operations.
pub type Result<T> = std::result::Result<T, OperaError>;

/// Errors that can occur while talking to OPERA Cloud.
#[derive(Debug, Error)]
pub enum OperaError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token endpoint did not answer 200
    #[error("Authentication failed ({status}): {body}")]
    Authentication { status: u16, body: String },

    /// Job submission did not answer 202
    #[error("Failed to start asynchronous job ({status}): {body}")]
    JobSubmission { status: u16, body: String },

    /// Status poll answered something other than 200/201/202/404
    #[error("Error checking job readiness ({status}): {reason}")]
    Poll { status: u16, reason: String },

    /// Job did not become ready within the poll policy bounds
    #[error("Job not ready after {attempts} polls ({waited:?})")]
    PollTimeout { attempts: u32, waited: Duration },

    /// Result download did not answer 200 or returned an unexpected body
    #[error("Failed to retrieve job result ({status}): {body}")]
    Fetch { status: u16, body: String },

    /// A response that must carry a Location header did not
    #[error("Missing Location header in {stage} response")]
    MissingLocation { stage: &'static str },

    /// Invalid request (bad header value, bad URL, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Retrieval stopped through its cancellation token
    #[error("Retrieval cancelled")]
    Cancelled,

    /// Domain error from the core crate
    #[error(transparent)]
    Core(#[from] hfcheck_core::Error),
}

impl OperaError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Transport failures worth another attempt: connection problems and
    /// timeouts. Protocol answers are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// The request never reached the server, so repeating it cannot create
    /// anything twice.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect())
    }

    /// HTTP status carried by protocol errors, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::JobSubmission { status, .. }
            | Self::Poll { status, .. }
            | Self::Fetch { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
