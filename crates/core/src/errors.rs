//! Core error types for hfcheck.
//!
//! Transport failures live in the `hfcheck-opera` crate; this module covers
//! everything that can go wrong while shaping inputs and reconciling them.

use chrono::NaiveDate;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the domain crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Unexpected API payload: {0}")]
    Schema(String),

    #[error("Malformed ledger file: {0}")]
    FileFormat(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_range(start: NaiveDate, end: NaiveDate) -> Self {
        Error::InvalidRange(format!("start {} is after end {}", start, end))
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Error::Schema(message.into())
    }

    pub fn file_format(message: impl Into<String>) -> Self {
        Error::FileFormat(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}
