//! Audit session: one credential set, one retriever, one fetch cache.

use log::info;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use hfcheck_core::{
    split_date_range, CachedFetch, Credentials, DateWindow, FetchCache, FetchKey,
    DEFAULT_MAX_WINDOW_DAYS,
};

use crate::error::Result;
use crate::retriever::{RetrievalReport, StatisticsRetriever};

/// Entry point for retrieving a hotel's statistics over a date range.
///
/// Complete retrievals are cached for the lifetime of the session; partial or
/// cancelled ones are not.
pub struct AuditSession {
    credentials: Credentials,
    retriever: StatisticsRetriever,
    cache: Arc<FetchCache>,
    max_window_days: u32,
}

impl AuditSession {
    pub fn new(credentials: Credentials, retriever: StatisticsRetriever) -> Self {
        Self {
            credentials,
            retriever,
            cache: Arc::new(FetchCache::new()),
            max_window_days: DEFAULT_MAX_WINDOW_DAYS,
        }
    }

    #[must_use]
    pub fn with_max_window_days(mut self, days: u32) -> Self {
        self.max_window_days = days;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<FetchCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Retrieves statistics for `hotel_id` over `range`, splitting it into
    /// windows of at most `max_window_days`.
    pub async fn fetch(
        &self,
        hotel_id: &str,
        range: DateWindow,
        cancel: &CancellationToken,
    ) -> Result<RetrievalReport> {
        let key = FetchKey::new(hotel_id, range, &self.credentials);
        if let Some(cached) = self.cache.get(&key) {
            info!("Using cached statistics for hotel {} ({})", hotel_id, range);
            return Ok(RetrievalReport {
                job_results: cached.job_results,
                completed_windows: cached.windows,
                from_cache: true,
                ..Default::default()
            });
        }

        let windows = split_date_range(range.start, range.end, self.max_window_days)?;
        info!(
            "Fetching statistics for hotel {} ({}) in {} window(s)",
            hotel_id,
            range,
            windows.len()
        );

        let report = self
            .retriever
            .run(&self.credentials, hotel_id, &windows, cancel)
            .await?;

        if report.is_complete() {
            self.cache.insert(
                key,
                CachedFetch {
                    windows: report.completed_windows.clone(),
                    job_results: report.job_results.clone(),
                },
            );
        }
        Ok(report)
    }

    /// Drops the cached statistics for one hotel and range.
    pub fn invalidate(&self, hotel_id: &str, range: DateWindow) -> bool {
        self.cache
            .invalidate(&FetchKey::new(hotel_id, range, &self.credentials))
    }
}
