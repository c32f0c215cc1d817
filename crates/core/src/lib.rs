//! hfcheck Core - domain types and reconciliation logic.
//!
//! This crate holds everything that does not talk to the network: date
//! windows, credentials, the statistics payload model, ledger parsing, the
//! reconciliation engine and the fetch cache. The `hfcheck-opera` crate
//! builds the OPERA Cloud client on top of it.

pub mod cache;
pub mod credentials;
pub mod dates;
pub mod errors;
pub mod ledger;
pub mod reconciliation;
pub mod stats;

pub use cache::{CachedFetch, FetchCache, FetchKey};
pub use credentials::Credentials;
pub use dates::{split_date_range, DateWindow, DEFAULT_MAX_WINDOW_DAYS};
pub use stats::{JobResult, StatRecord, StatisticsPayload};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
