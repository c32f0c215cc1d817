//! hfcheck OPERA - OPERA Cloud revenue & inventory statistics retrieval.
//!
//! This crate provides the HTTP client for the token and asynchronous job
//! endpoints, and the orchestrator that runs one job per date window.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hfcheck_opera::{AuditSession, OperaClient, StatisticsRetriever};
//!
//! let client = OperaClient::with_default_timeout()?;
//! let session = AuditSession::new(credentials, StatisticsRetriever::new(Arc::new(client)));
//! let report = session.fetch("HOTEL1", range, &CancellationToken::new()).await?;
//! ```

mod api;
mod client;
mod error;
mod policy;
mod retriever;
mod session;
mod types;

#[cfg(test)]
mod retriever_tests;

pub use api::{JobContext, StatisticsApi};
pub use client::{OperaClient, DEFAULT_TIMEOUT_SECS};
pub use error::{OperaError, Result};
pub use policy::{
    PollPolicy, RetryPolicy, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_MAX_INTERVAL_SECS,
    DEFAULT_POLL_MAX_WAIT_SECS,
};
pub use retriever::{RetrievalReport, StatisticsRetriever, WindowFailure};
pub use session::AuditSession;
pub use types::*;

pub use tokio_util::sync::CancellationToken;
