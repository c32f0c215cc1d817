use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::accuracy::AccuracySummary;

/// Ledger and API figures for one matched date, with their differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRow {
    pub date: NaiveDate,
    pub ledger_room_nights: Decimal,
    pub ledger_revenue: Decimal,
    pub api_room_nights: Decimal,
    pub api_revenue: Decimal,
    /// ledger - api
    pub room_night_delta: Decimal,
    /// ledger - api, rounded to 2 dp
    pub revenue_delta: Decimal,
}

impl ReconciledRow {
    pub fn has_discrepancy(&self) -> bool {
        !self.room_night_delta.is_zero() || !self.revenue_delta.is_zero()
    }
}

/// Which of the two metrics disagrees on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// Room nights differ while revenue matches.
    RoomNightsWithoutRevenue,
    /// Revenue differs while room nights match.
    RevenueWithoutRoomNights,
}

impl AnomalyKind {
    pub fn describe(&self) -> &'static str {
        match self {
            AnomalyKind::RoomNightsWithoutRevenue => {
                "room night discrepancy without a matching revenue discrepancy"
            }
            AnomalyKind::RevenueWithoutRoomNights => {
                "revenue discrepancy without a matching room night discrepancy"
            }
        }
    }
}

/// Non-fatal marker pointing at a likely configuration mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub date: NaiveDate,
    pub kind: AnomalyKind,
}

/// Output shape of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Row-level comparison per date.
    #[default]
    Daily,
    /// Aggregate past/future totals only.
    Totals,
}

/// Result of [`ReconciliationEngine::run`](super::ReconciliationEngine::run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub mode: ReconcileMode,
    /// Matched rows; empty in `Totals` mode.
    pub rows: Vec<ReconciledRow>,
    pub anomalies: Vec<Anomaly>,
    pub summary: AccuracySummary,
    /// Number of matched dates, independent of mode.
    pub matched_count: usize,
    /// User-facing explanation when the report is empty because the input
    /// could not be reconciled.
    pub notice: Option<String>,
}

impl ReconcileReport {
    pub fn empty(mode: ReconcileMode, notice: impl Into<String>) -> Self {
        Self {
            mode,
            rows: Vec::new(),
            anomalies: Vec::new(),
            summary: AccuracySummary::default(),
            matched_count: 0,
            notice: Some(notice.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matched_count == 0
    }

    /// Rows with any non-zero delta.
    pub fn discrepancies(&self) -> impl Iterator<Item = &ReconciledRow> {
        self.rows.iter().filter(|row| row.has_discrepancy())
    }

    pub fn has_anomaly(&self, kind: AnomalyKind) -> bool {
        self.anomalies.iter().any(|a| a.kind == kind)
    }
}
