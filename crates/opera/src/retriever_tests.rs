//! Tests for StatisticsRetriever and AuditSession orchestration.
//!
//! The HTTP layer is replaced by a scripted StatisticsApi so that window
//! ordering, failure isolation, polling bounds, retries and cancellation can
//! be checked without a server.

#[cfg(test)]
mod tests {
    use crate::api::{JobContext, StatisticsApi};
    use crate::error::{OperaError, Result};
    use crate::policy::{PollPolicy, RetryPolicy};
    use crate::retriever::StatisticsRetriever;
    use crate::session::AuditSession;
    use crate::types::{AccessToken, JobHandle, PollStatus};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use hfcheck_core::{split_date_range, Credentials, DateWindow, JobResult, StatRecord};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    // =========================================================================
    // Scripted StatisticsApi
    // =========================================================================

    #[derive(Default)]
    struct Calls {
        auth: u32,
        submits: Vec<NaiveDate>,
        polls: HashMap<NaiveDate, u32>,
        fetches: Vec<NaiveDate>,
    }

    #[derive(Clone, Default)]
    struct ScriptedApi {
        calls: Arc<Mutex<Calls>>,
        auth_failure: Option<u16>,
        transient_auth_failures: Arc<Mutex<u32>>,
        failing_submits: Vec<NaiveDate>,
        transient_submit_failures: Arc<Mutex<u32>>,
        failing_polls: Vec<NaiveDate>,
        failing_fetches: Vec<NaiveDate>,
        never_ready: Vec<NaiveDate>,
        pending_polls: u32,
        cancel_on_poll: Option<(NaiveDate, CancellationToken)>,
    }

    impl ScriptedApi {
        fn new() -> Self {
            Self::default()
        }

        fn auth_calls(&self) -> u32 {
            self.calls.lock().unwrap().auth
        }

        fn submits(&self) -> Vec<NaiveDate> {
            self.calls.lock().unwrap().submits.clone()
        }

        fn polls_for(&self, start: NaiveDate) -> u32 {
            self.calls
                .lock()
                .unwrap()
                .polls
                .get(&start)
                .copied()
                .unwrap_or(0)
        }

        fn total_polls(&self) -> u32 {
            self.calls.lock().unwrap().polls.values().sum()
        }

        fn fetch_count(&self) -> usize {
            self.calls.lock().unwrap().fetches.len()
        }
    }

    fn window_start(handle: &JobHandle) -> NaiveDate {
        let raw = handle.location.rsplit('/').next().unwrap();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    async fn connect_error() -> OperaError {
        let error = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        OperaError::Http(error)
    }

    #[async_trait]
    impl StatisticsApi for ScriptedApi {
        async fn authenticate(&self, _credentials: &Credentials) -> Result<AccessToken> {
            self.calls.lock().unwrap().auth += 1;

            let transient = {
                let mut remaining = self.transient_auth_failures.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    true
                } else {
                    false
                }
            };
            if transient {
                return Err(connect_error().await);
            }

            if let Some(status) = self.auth_failure {
                return Err(OperaError::Authentication {
                    status,
                    body: "invalid_grant".to_string(),
                });
            }
            Ok(AccessToken::new("token-123"))
        }

        async fn submit_job(
            &self,
            _ctx: &JobContext<'_>,
            window: &DateWindow,
        ) -> Result<JobHandle> {
            self.calls.lock().unwrap().submits.push(window.start);

            let transient = {
                let mut remaining = self.transient_submit_failures.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    true
                } else {
                    false
                }
            };
            if transient {
                return Err(connect_error().await);
            }

            if self.failing_submits.contains(&window.start) {
                return Err(OperaError::JobSubmission {
                    status: 500,
                    body: "Internal Server Error".to_string(),
                });
            }
            Ok(JobHandle::new(format!(
                "https://opera.test/jobs/{}",
                window.start
            )))
        }

        async fn poll_job(&self, _ctx: &JobContext<'_>, job: &JobHandle) -> Result<PollStatus> {
            let start = window_start(job);
            let count = {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.polls.entry(start).or_insert(0);
                *count += 1;
                *count
            };

            if self.failing_polls.contains(&start) {
                return Err(OperaError::Poll {
                    status: 500,
                    reason: "Internal Server Error".to_string(),
                });
            }
            if let Some((date, token)) = &self.cancel_on_poll {
                if *date == start {
                    token.cancel();
                    return Ok(PollStatus::Pending);
                }
            }
            if self.never_ready.contains(&start) || count <= self.pending_polls {
                return Ok(PollStatus::Pending);
            }
            Ok(PollStatus::Ready(JobHandle::new(format!(
                "https://opera.test/results/{}",
                start
            ))))
        }

        async fn fetch_result(
            &self,
            ctx: &JobContext<'_>,
            result: &JobHandle,
        ) -> Result<Vec<JobResult>> {
            let start = window_start(result);
            self.calls.lock().unwrap().fetches.push(start);
            if self.failing_fetches.contains(&start) {
                return Err(OperaError::Fetch {
                    status: 410,
                    body: "result expired".to_string(),
                });
            }
            Ok(vec![JobResult::new(
                Some(ctx.hotel_id.to_string()),
                vec![StatRecord {
                    occupancy_date: start,
                    rooms_sold: Some(dec!(10)),
                    room_revenue: Some(dec!(1000.00)),
                }],
            )])
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn credentials() -> Credentials {
        Credentials {
            app_key: "app-key".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            hostname: "https://opera.test".to_string(),
            external_system_id: "EXT1".to_string(),
        }
    }

    /// Three 10-day windows starting 2024-01-01, 01-11 and 01-21.
    fn windows() -> Vec<DateWindow> {
        split_date_range(date(2024, 1, 1), date(2024, 1, 30), 10).unwrap()
    }

    fn no_delay_retry() -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    fn retriever(api: &ScriptedApi) -> StatisticsRetriever {
        StatisticsRetriever::new(Arc::new(api.clone()))
            .with_poll_policy(PollPolicy::fixed(Duration::ZERO).with_max_attempts(5))
            .with_retry_policy(no_delay_retry())
    }

    fn result_dates(results: &[JobResult]) -> Vec<NaiveDate> {
        results
            .iter()
            .flat_map(|r| r.stat_records.iter().flatten())
            .map(|r| r.occupancy_date)
            .collect()
    }

    // =========================================================================
    // Retriever
    // =========================================================================

    #[tokio::test]
    async fn test_all_windows_retrieved_in_order() {
        let api = ScriptedApi::new();
        let windows = windows();

        let report = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_complete());
        assert!(!report.from_cache);
        assert_eq!(report.completed_windows, windows);
        assert_eq!(
            result_dates(&report.job_results),
            vec![date(2024, 1, 1), date(2024, 1, 11), date(2024, 1, 21)]
        );
        assert_eq!(report.record_count(), 3);
        assert_eq!(api.auth_calls(), 1);
        assert_eq!(api.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_authentication_failure_stops_before_any_job() {
        let api = ScriptedApi {
            auth_failure: Some(401),
            ..ScriptedApi::new()
        };

        let result = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows(), &CancellationToken::new())
            .await;

        match result {
            Err(OperaError::Authentication { status, .. }) => assert_eq!(status, 401),
            other => panic!("expected authentication error, got {:?}", other),
        }
        assert_eq!(api.auth_calls(), 1);
        assert!(api.submits().is_empty());
        assert_eq!(api.total_polls(), 0);
        assert_eq!(api.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_window_is_skipped_and_others_kept() {
        let windows = windows();
        let api = ScriptedApi {
            failing_submits: vec![windows[1].start],
            ..ScriptedApi::new()
        };

        let report = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failed_window_count(), 1);
        assert_eq!(report.failures[0].window, windows[1]);
        assert_eq!(report.failures[0].error.status(), Some(500));
        assert_eq!(report.completed_windows, vec![windows[0], windows[2]]);
        assert_eq!(
            result_dates(&report.job_results),
            vec![date(2024, 1, 1), date(2024, 1, 21)]
        );
        // The failed window is never polled
        assert_eq!(api.polls_for(windows[1].start), 0);
    }

    #[tokio::test]
    async fn test_poll_error_fails_only_that_window() {
        let windows = windows();
        let api = ScriptedApi {
            failing_polls: vec![windows[1].start],
            ..ScriptedApi::new()
        };

        let report = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.failed_window_count(), 1);
        assert_eq!(report.failures[0].window, windows[1]);
        assert!(matches!(
            report.failures[0].error,
            OperaError::Poll { status: 500, .. }
        ));
        assert_eq!(report.completed_windows, vec![windows[0], windows[2]]);
        assert_eq!(
            result_dates(&report.job_results),
            vec![date(2024, 1, 1), date(2024, 1, 21)]
        );
        // Status errors end polling at once and never reach the fetch
        assert_eq!(api.polls_for(windows[1].start), 1);
        assert_eq!(api.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_fails_only_that_window() {
        let windows = windows();
        let api = ScriptedApi {
            failing_fetches: vec![windows[1].start],
            ..ScriptedApi::new()
        };

        let report = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.failed_window_count(), 1);
        assert_eq!(report.failures[0].window, windows[1]);
        match &report.failures[0].error {
            OperaError::Fetch { status, body } => {
                assert_eq!(*status, 410);
                assert_eq!(body, "result expired");
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
        assert_eq!(report.completed_windows, vec![windows[0], windows[2]]);
        assert_eq!(
            result_dates(&report.job_results),
            vec![date(2024, 1, 1), date(2024, 1, 21)]
        );
        assert_eq!(api.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_pending_job_is_polled_until_ready() {
        let api = ScriptedApi {
            pending_polls: 2,
            ..ScriptedApi::new()
        };
        let windows = windows();

        let report = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows[..1], &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(api.polls_for(windows[0].start), 3);
    }

    #[tokio::test]
    async fn test_poll_attempt_limit_fails_only_that_window() {
        let windows = windows();
        let api = ScriptedApi {
            never_ready: vec![windows[0].start],
            ..ScriptedApi::new()
        };
        let retriever = retriever(&api)
            .with_poll_policy(PollPolicy::fixed(Duration::ZERO).with_max_attempts(3));

        let report = retriever
            .run(&credentials(), "HOTEL1", &windows, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.failed_window_count(), 1);
        assert!(matches!(
            report.failures[0].error,
            OperaError::PollTimeout { attempts: 3, .. }
        ));
        assert_eq!(api.polls_for(windows[0].start), 3);
        assert_eq!(report.completed_windows, vec![windows[1], windows[2]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_max_wait_bounds_total_time() {
        let windows = windows();
        let api = ScriptedApi {
            never_ready: vec![windows[0].start],
            ..ScriptedApi::new()
        };
        let retriever = retriever(&api).with_poll_policy(
            PollPolicy::fixed(Duration::from_secs(10)).with_max_wait(Duration::from_secs(35)),
        );

        let report = retriever
            .run(&credentials(), "HOTEL1", &windows[..1], &CancellationToken::new())
            .await
            .unwrap();

        match &report.failures[0].error {
            OperaError::PollTimeout { attempts, waited } => {
                assert_eq!(*attempts, 4);
                assert!(*waited >= Duration::from_secs(30));
                assert!(*waited <= Duration::from_secs(35));
            }
            other => panic!("expected poll timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_run_makes_no_calls() {
        let api = ScriptedApi::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows(), &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(!report.is_complete());
        assert!(report.job_results.is_empty());
        assert_eq!(api.auth_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_while_polling_keeps_finished_windows() {
        let windows = windows();
        let cancel = CancellationToken::new();
        let api = ScriptedApi {
            cancel_on_poll: Some((windows[1].start, cancel.clone())),
            ..ScriptedApi::new()
        };
        let retriever = retriever(&api)
            .with_poll_policy(PollPolicy::fixed(Duration::from_secs(60)));

        let report = retriever
            .run(&credentials(), "HOTEL1", &windows, &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.failures.is_empty());
        assert_eq!(report.completed_windows, vec![windows[0]]);
        assert_eq!(result_dates(&report.job_results), vec![date(2024, 1, 1)]);
        assert_eq!(api.submits(), vec![windows[0].start, windows[1].start]);
    }

    #[tokio::test]
    async fn test_transient_authentication_failure_is_retried() {
        let api = ScriptedApi {
            transient_auth_failures: Arc::new(Mutex::new(2)),
            ..ScriptedApi::new()
        };

        let report = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(api.auth_calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let api = ScriptedApi {
            transient_auth_failures: Arc::new(Mutex::new(5)),
            ..ScriptedApi::new()
        };

        let error = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(error.is_transient());
        assert_eq!(api.auth_calls(), 3);
        assert!(api.submits().is_empty());
    }

    #[tokio::test]
    async fn test_submission_is_retried_after_connect_failure() {
        let windows = windows();
        let api = ScriptedApi {
            transient_submit_failures: Arc::new(Mutex::new(1)),
            ..ScriptedApi::new()
        };

        let report = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows[..1], &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(api.submits(), vec![windows[0].start, windows[0].start]);
    }

    #[tokio::test]
    async fn test_protocol_errors_are_not_retried() {
        let api = ScriptedApi {
            auth_failure: Some(403),
            ..ScriptedApi::new()
        };

        let _ = retriever(&api)
            .run(&credentials(), "HOTEL1", &windows(), &CancellationToken::new())
            .await;

        assert_eq!(api.auth_calls(), 1);
    }

    // =========================================================================
    // AuditSession
    // =========================================================================

    fn full_range() -> DateWindow {
        DateWindow::new(date(2024, 1, 1), date(2024, 1, 30)).unwrap()
    }

    #[tokio::test]
    async fn test_session_splits_range_and_serves_repeat_from_cache() {
        let api = ScriptedApi::new();
        let session = AuditSession::new(credentials(), retriever(&api)).with_max_window_days(10);
        let cancel = CancellationToken::new();

        let first = session.fetch("HOTEL1", full_range(), &cancel).await.unwrap();
        assert_eq!(first.completed_windows.len(), 3);
        assert!(!first.from_cache);
        assert_eq!(session.cache().len(), 1);

        let second = session.fetch("HOTEL1", full_range(), &cancel).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.job_results, first.job_results);
        assert_eq!(second.completed_windows, first.completed_windows);
        assert_eq!(api.auth_calls(), 1);
        assert_eq!(api.submits().len(), 3);
    }

    #[tokio::test]
    async fn test_session_does_not_cache_partial_retrieval() {
        let api = ScriptedApi {
            failing_submits: vec![date(2024, 1, 11)],
            ..ScriptedApi::new()
        };
        let session = AuditSession::new(credentials(), retriever(&api)).with_max_window_days(10);
        let cancel = CancellationToken::new();

        let first = session.fetch("HOTEL1", full_range(), &cancel).await.unwrap();
        assert_eq!(first.failed_window_count(), 1);
        assert!(session.cache().is_empty());

        session.fetch("HOTEL1", full_range(), &cancel).await.unwrap();
        assert_eq!(api.auth_calls(), 2);
    }

    #[tokio::test]
    async fn test_session_invalidate_forces_refetch() {
        let api = ScriptedApi::new();
        let session = AuditSession::new(credentials(), retriever(&api));
        let cancel = CancellationToken::new();

        session.fetch("HOTEL1", full_range(), &cancel).await.unwrap();
        assert!(session.invalidate("HOTEL1", full_range()));
        assert!(!session.invalidate("HOTEL1", full_range()));

        session.fetch("HOTEL1", full_range(), &cancel).await.unwrap();
        assert_eq!(api.auth_calls(), 2);
    }

    #[tokio::test]
    async fn test_session_rejects_zero_window_length() {
        let api = ScriptedApi::new();
        let session = AuditSession::new(credentials(), retriever(&api)).with_max_window_days(0);

        let error = session
            .fetch("HOTEL1", full_range(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, OperaError::Core(_)));
        assert_eq!(api.auth_calls(), 0);
    }
}
