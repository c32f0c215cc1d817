use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::accuracy::AccuracySummary;
use super::reconciliation_model::{
    Anomaly, AnomalyKind, ReconcileMode, ReconcileReport, ReconciledRow,
};
use crate::errors::{Error, Result};
use crate::ledger::LedgerRow;
use crate::stats::{JobResult, StatRecord};

/// Inner-joins ledger rows with API statistics on date.
///
/// Dates present on only one side are dropped. Duplicated dates yield one row
/// per (ledger, api) pair, in ledger order then API order. Missing numbers
/// count as zero.
///
/// Fails with [`Error::Schema`] when there are no job results or one of them
/// lacks the nested statistics list.
pub fn reconcile(
    api_results: &[JobResult],
    ledger_rows: &[LedgerRow],
) -> Result<Vec<ReconciledRow>> {
    let records = flatten_records(api_results)?;

    let mut by_date: HashMap<NaiveDate, Vec<&StatRecord>> = HashMap::new();
    for record in records.iter().copied() {
        by_date.entry(record.occupancy_date).or_default().push(record);
    }

    let mut rows = Vec::new();
    let mut unmatched_ledger = 0usize;
    for ledger in ledger_rows {
        let Some(matches) = by_date.get(&ledger.arrival_date) else {
            unmatched_ledger += 1;
            continue;
        };
        for api in matches {
            rows.push(reconcile_row(ledger, api));
        }
    }

    debug!(
        "Reconciled {} rows ({} ledger rows and {} API records in; {} ledger dates without API data)",
        rows.len(),
        ledger_rows.len(),
        records.len(),
        unmatched_ledger
    );
    Ok(rows)
}

fn flatten_records(api_results: &[JobResult]) -> Result<Vec<&StatRecord>> {
    if api_results.is_empty() {
        return Err(Error::schema("the API returned no job results"));
    }

    let mut records = Vec::new();
    for (idx, result) in api_results.iter().enumerate() {
        let nested = result.stat_records.as_ref().ok_or_else(|| {
            Error::schema(format!(
                "job result {} has no 'revInvStats' list; check the API response structure",
                idx
            ))
        })?;
        records.extend(nested.iter());
    }
    Ok(records)
}

fn reconcile_row(ledger: &LedgerRow, api: &StatRecord) -> ReconciledRow {
    let ledger_room_nights = ledger.room_nights.unwrap_or(Decimal::ZERO);
    let ledger_revenue = ledger.net_revenue.unwrap_or(Decimal::ZERO);
    let api_room_nights = api.rooms_sold.unwrap_or(Decimal::ZERO);
    let api_revenue = api.room_revenue.unwrap_or(Decimal::ZERO);

    ReconciledRow {
        date: ledger.arrival_date,
        ledger_room_nights,
        ledger_revenue,
        api_room_nights,
        api_revenue,
        room_night_delta: ledger_room_nights - api_room_nights,
        // Banker's rounding, half to even.
        revenue_delta: (ledger_revenue - api_revenue).round_dp(2),
    }
}

/// Flags rows where exactly one of the two deltas is zero.
pub fn detect_anomalies(rows: &[ReconciledRow]) -> Vec<Anomaly> {
    rows.iter()
        .filter_map(|row| {
            let rn_off = !row.room_night_delta.is_zero();
            let rev_off = !row.revenue_delta.is_zero();
            let kind = match (rn_off, rev_off) {
                (true, false) => AnomalyKind::RoomNightsWithoutRevenue,
                (false, true) => AnomalyKind::RevenueWithoutRoomNights,
                _ => return None,
            };
            Some(Anomaly {
                date: row.date,
                kind,
            })
        })
        .collect()
}

/// Single entry point for both reconciliation views.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Reconciles and summarizes.
    ///
    /// Schema problems in the API data produce an empty report with a notice
    /// rather than an error.
    pub fn run(
        &self,
        api_results: &[JobResult],
        ledger_rows: &[LedgerRow],
        mode: ReconcileMode,
        today: NaiveDate,
    ) -> ReconcileReport {
        let rows = match reconcile(api_results, ledger_rows) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Reconciliation skipped: {}", e);
                return ReconcileReport::empty(mode, e.to_string());
            }
        };

        let anomalies = detect_anomalies(&rows);
        for kind in [
            AnomalyKind::RoomNightsWithoutRevenue,
            AnomalyKind::RevenueWithoutRoomNights,
        ] {
            let count = anomalies.iter().filter(|a| a.kind == kind).count();
            if count > 0 {
                warn!("{} day(s) with {}", count, kind.describe());
            }
        }

        let summary = AccuracySummary::compute(&rows, today);
        let matched_count = rows.len();
        let notice = (matched_count == 0)
            .then(|| "no ledger date matched the API statistics".to_string());

        ReconcileReport {
            mode,
            rows: match mode {
                ReconcileMode::Daily => rows,
                ReconcileMode::Totals => Vec::new(),
            },
            anomalies,
            summary,
            matched_count,
            notice,
        }
    }
}
