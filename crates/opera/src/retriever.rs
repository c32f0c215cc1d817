//! Window-by-window orchestration of the asynchronous statistics protocol.
//!
//! For every window: submit a job, poll it until ready, download the result.
//! Windows run strictly one after another. A failing window is recorded and
//! skipped; only authentication problems and cancellation end the run.

use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use hfcheck_core::{Credentials, DateWindow, JobResult};

use crate::api::{JobContext, StatisticsApi};
use crate::error::{OperaError, Result};
use crate::policy::{PollPolicy, RetryPolicy};
use crate::types::{AccessToken, JobHandle, PollStatus};

/// A window that contributed nothing, and why.
#[derive(Debug)]
pub struct WindowFailure {
    pub window: DateWindow,
    pub error: OperaError,
}

/// Aggregated outcome of one retrieval.
#[derive(Debug, Default)]
pub struct RetrievalReport {
    /// Job results of every completed window, in window order.
    pub job_results: Vec<JobResult>,
    pub completed_windows: Vec<DateWindow>,
    pub failures: Vec<WindowFailure>,
    /// Set when the cancellation token stopped the run early.
    pub cancelled: bool,
    /// Set when the results were served from the fetch cache.
    pub from_cache: bool,
}

impl RetrievalReport {
    pub fn failed_window_count(&self) -> usize {
        self.failures.len()
    }

    /// No failed window and not cancelled.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Number of daily records across all job results.
    pub fn record_count(&self) -> usize {
        self.job_results
            .iter()
            .filter_map(|r| r.stat_records.as_ref())
            .map(Vec::len)
            .sum()
    }
}

/// Drives [`StatisticsApi`] through the submit/poll/fetch cycle.
#[derive(Clone)]
pub struct StatisticsRetriever {
    api: Arc<dyn StatisticsApi>,
    poll: PollPolicy,
    retry: RetryPolicy,
}

impl StatisticsRetriever {
    pub fn new(api: Arc<dyn StatisticsApi>) -> Self {
        Self {
            api,
            poll: PollPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Authenticates once, then retrieves every window.
    ///
    /// An authentication failure is returned as an error and no job is
    /// submitted. Everything after that is reported through the
    /// [`RetrievalReport`].
    pub async fn run(
        &self,
        credentials: &Credentials,
        hotel_id: &str,
        windows: &[DateWindow],
        cancel: &CancellationToken,
    ) -> Result<RetrievalReport> {
        if cancel.is_cancelled() {
            info!("Retrieval cancelled before authentication");
            return Ok(RetrievalReport {
                cancelled: true,
                ..Default::default()
            });
        }

        let token = self.authenticate(credentials, cancel).await?;
        Ok(self
            .retrieve(&token, credentials, hotel_id, windows, cancel)
            .await)
    }

    /// Obtains a bearer token, retrying transport failures only.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<AccessToken> {
        let api = &self.api;
        self.with_retry("authentication", cancel, OperaError::is_transient, move || {
            api.authenticate(credentials)
        })
            .await
            .inspect_err(|e| warn!("Authentication failed, aborting retrieval: {}", e))
    }

    /// Processes `windows` in order with an existing token.
    pub async fn retrieve(
        &self,
        token: &AccessToken,
        credentials: &Credentials,
        hotel_id: &str,
        windows: &[DateWindow],
        cancel: &CancellationToken,
    ) -> RetrievalReport {
        let ctx = JobContext {
            token,
            credentials,
            hotel_id,
        };
        let mut report = RetrievalReport::default();

        for (idx, window) in windows.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            info!(
                "Retrieving window {}/{} ({}) for hotel {}",
                idx + 1,
                windows.len(),
                window,
                hotel_id
            );

            match self.process_window(&ctx, window, cancel).await {
                Ok(results) => {
                    report.job_results.extend(results);
                    report.completed_windows.push(*window);
                }
                Err(OperaError::Cancelled) => {
                    info!("Retrieval cancelled during window {}", window);
                    report.cancelled = true;
                    break;
                }
                Err(error) => {
                    warn!("Window {} failed: {}", window, error);
                    report.failures.push(WindowFailure {
                        window: *window,
                        error,
                    });
                }
            }
        }

        info!(
            "Retrieval finished: {} window(s) completed, {} failed, {} record(s){}",
            report.completed_windows.len(),
            report.failures.len(),
            report.record_count(),
            if report.cancelled { ", cancelled" } else { "" }
        );
        report
    }

    async fn process_window(
        &self,
        ctx: &JobContext<'_>,
        window: &DateWindow,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobResult>> {
        let api = &self.api;

        // A timed-out submission may already have queued a job remotely.
        let job = self
            .with_retry(
                "job submission",
                cancel,
                OperaError::is_connect_failure,
                move || api.submit_job(ctx, window),
            )
            .await?;
        debug!("Job for {} accepted at {}", window, job);

        let result = self.wait_until_ready(ctx, &job, cancel).await?;

        let result_ref = &result;
        self.with_retry("result fetch", cancel, OperaError::is_transient, move || {
            api.fetch_result(ctx, result_ref)
        })
        .await
    }

    /// Polls `job` until it reports ready, within the poll policy bounds.
    async fn wait_until_ready(
        &self,
        ctx: &JobContext<'_>,
        job: &JobHandle,
        cancel: &CancellationToken,
    ) -> Result<JobHandle> {
        let api = &self.api;
        let started = Instant::now();
        let mut delay = self.poll.initial_interval;
        let mut attempts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(OperaError::Cancelled);
            }

            attempts += 1;
            let status = self
                .with_retry("status poll", cancel, OperaError::is_transient, move || {
                    api.poll_job(ctx, job)
                })
                .await?;

            if let PollStatus::Ready(result) = status {
                debug!("Job {} ready after {} poll(s)", job, attempts);
                return Ok(result);
            }

            let waited = started.elapsed();
            if !self.poll.allows(attempts, waited, delay) {
                return Err(OperaError::PollTimeout { attempts, waited });
            }

            debug!("Job {} pending, next poll in {:?}", job, delay);
            sleep_or_cancel(delay, cancel).await?;
            delay = self.poll.next_interval(delay);
        }
    }

    async fn with_retry<T, F, Fut>(
        &self,
        stage: &str,
        cancel: &CancellationToken,
        retryable: fn(&OperaError) -> bool,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0u32;
        loop {
            match op().await {
                Err(e) if retryable(&e) && retries < self.retry.max_retries => {
                    let backoff = self.retry.backoff(retries);
                    retries += 1;
                    warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        stage, e, retries, self.retry.max_retries, backoff
                    );
                    sleep_or_cancel(backoff, cancel).await?;
                }
                other => return other,
            }
        }
    }
}

async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OperaError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
