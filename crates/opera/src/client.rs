//! HTTP client for the OPERA Cloud token and asynchronous statistics endpoints.

use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{StatusCode, Url};
use std::time::Duration;

use hfcheck_core::{Credentials, DateWindow, JobResult, StatisticsPayload};

use crate::api::{JobContext, StatisticsApi};
use crate::error::{OperaError, Result};
use crate::types::*;

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the OPERA Cloud statistics API.
///
/// The host comes from the [`Credentials`] of each call, so one client can
/// serve several tenants.
#[derive(Debug, Clone)]
pub struct OperaClient {
    client: reqwest::Client,
}

impl OperaClient {
    /// Create a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Create a client with the default 30 second timeout.
    pub fn with_default_timeout() -> Result<Self> {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Headers shared by every call made with a bearer token.
    fn headers(&self, ctx: &JobContext<'_>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", ctx.token.as_str()))
            .map_err(|_| OperaError::invalid_request("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert("x-app-key", app_key_header(ctx.credentials)?);

        let hotel_value = HeaderValue::from_str(ctx.hotel_id)
            .map_err(|_| OperaError::invalid_request("Invalid hotel ID format"))?;
        headers.insert("x-hotelid", hotel_value);

        Ok(headers)
    }

    /// Reads the `Location` header and resolves it against the tenant host.
    fn location(
        response: &reqwest::Response,
        credentials: &Credentials,
        stage: &'static str,
    ) -> Result<JobHandle> {
        let raw = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .ok_or(OperaError::MissingLocation { stage })?;

        let base = Url::parse(&format!("{}/", credentials.hostname))
            .map_err(|e| OperaError::invalid_request(format!("Invalid hostname: {}", e)))?;
        let resolved = base
            .join(raw.trim())
            .map_err(|e| OperaError::invalid_request(format!("Invalid Location '{}': {}", raw, e)))?;

        Ok(JobHandle::new(resolved.to_string()))
    }
}

fn app_key_header(credentials: &Credentials) -> Result<HeaderValue> {
    HeaderValue::from_str(&credentials.app_key)
        .map_err(|_| OperaError::invalid_request("Invalid app key format"))
}

fn statistics_url(credentials: &Credentials, hotel_id: &str) -> String {
    format!(
        "{}/inv/async/v1/externalSystems/{}/hotels/{}/revenueInventoryStatistics",
        credentials.hostname, credentials.external_system_id, hotel_id
    )
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown status")
        .to_string()
}

#[async_trait]
impl StatisticsApi for OperaClient {
    /// POST /oauth/v1/tokens
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken> {
        let url = format!("{}/oauth/v1/tokens", credentials.hostname);
        debug!("[Opera] Requesting token from {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-app-key", app_key_header(credentials)?)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("grant_type", "password"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            error!("[Opera] Authentication failed ({})", status);
            return Err(OperaError::Authentication {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            OperaError::Authentication {
                status: status.as_u16(),
                body: format!("Failed to parse token response: {}", e),
            }
        })?;
        Ok(AccessToken::new(token.access_token))
    }

    /// POST /inv/async/v1/externalSystems/{ext}/hotels/{hotel}/revenueInventoryStatistics
    async fn submit_job(&self, ctx: &JobContext<'_>, window: &DateWindow) -> Result<JobHandle> {
        let url = statistics_url(ctx.credentials, ctx.hotel_id);
        debug!("[Opera] Submitting statistics job for {} to {}", window, url);

        let mut headers = self.headers(ctx)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&StatisticsJobRequest::for_window(window))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(OperaError::JobSubmission {
                status: status.as_u16(),
                body,
            });
        }

        Self::location(&response, ctx.credentials, "submission")
    }

    /// HEAD <job location>
    async fn poll_job(&self, ctx: &JobContext<'_>, job: &JobHandle) -> Result<PollStatus> {
        let response = self
            .client
            .head(&job.location)
            .headers(self.headers(ctx)?)
            .send()
            .await?;

        let status = response.status();
        debug!("[Opera] Poll {} -> {}", job, status);

        match status {
            StatusCode::CREATED => {
                Self::location(&response, ctx.credentials, "status").map(PollStatus::Ready)
            }
            StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NOT_FOUND => Ok(PollStatus::Pending),
            other => Err(OperaError::Poll {
                status: other.as_u16(),
                reason: reason(other),
            }),
        }
    }

    /// GET <result location>
    async fn fetch_result(
        &self,
        ctx: &JobContext<'_>,
        result: &JobHandle,
    ) -> Result<Vec<JobResult>> {
        debug!("[Opera] Fetching job result from {}", result);

        let response = self
            .client
            .get(&result.location)
            .headers(self.headers(ctx)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(OperaError::Fetch {
                status: status.as_u16(),
                body: if body.is_empty() { reason(status) } else { body },
            });
        }

        let payload: StatisticsPayload = serde_json::from_str(&body).map_err(|e| {
            error!("[Opera] Unexpected result payload: {}", e);
            OperaError::Fetch {
                status: status.as_u16(),
                body: format!("Failed to parse result payload: {}", e),
            }
        })?;
        Ok(payload.job_results)
    }
}
