//! Trait seam between the job orchestrator and the HTTP client.

use async_trait::async_trait;

use hfcheck_core::{Credentials, DateWindow, JobResult};

use crate::error::Result;
use crate::types::{AccessToken, JobHandle, PollStatus};

/// Everything a job request needs besides the window itself.
#[derive(Debug, Clone, Copy)]
pub struct JobContext<'a> {
    pub token: &'a AccessToken,
    pub credentials: &'a Credentials,
    pub hotel_id: &'a str,
}

/// The four calls of the asynchronous statistics protocol.
///
/// [`OperaClient`](crate::OperaClient) implements this over HTTP; the
/// orchestrator only depends on the trait.
#[async_trait]
pub trait StatisticsApi: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken>;

    /// Starts an extraction job for one window.
    async fn submit_job(&self, ctx: &JobContext<'_>, window: &DateWindow) -> Result<JobHandle>;

    /// Single readiness poll; never waits.
    async fn poll_job(&self, ctx: &JobContext<'_>, job: &JobHandle) -> Result<PollStatus>;

    /// Downloads a finished job's results.
    async fn fetch_result(&self, ctx: &JobContext<'_>, result: &JobHandle)
        -> Result<Vec<JobResult>>;
}
