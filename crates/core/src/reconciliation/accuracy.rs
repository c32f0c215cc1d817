//! Past/future accuracy KPIs over reconciled rows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::reconciliation_model::ReconciledRow;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Aggregate discrepancy figures for one side of the cutoff date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentAccuracy {
    pub row_count: usize,
    pub ledger_room_nights: Decimal,
    pub ledger_revenue: Decimal,
    /// Σ |room_night_delta|
    pub abs_room_night_discrepancy: Decimal,
    /// Σ |revenue_delta|
    pub abs_revenue_discrepancy: Decimal,
    /// `None` when the ledger room-night total is zero.
    pub room_night_discrepancy_pct: Option<Decimal>,
    /// `None` when the ledger revenue total is zero.
    pub revenue_discrepancy_pct: Option<Decimal>,
}

impl SegmentAccuracy {
    fn from_rows<'a>(rows: impl Iterator<Item = &'a ReconciledRow>) -> Self {
        let mut segment = SegmentAccuracy::default();
        for row in rows {
            segment.row_count += 1;
            segment.ledger_room_nights += row.ledger_room_nights;
            segment.ledger_revenue += row.ledger_revenue;
            segment.abs_room_night_discrepancy += row.room_night_delta.abs();
            segment.abs_revenue_discrepancy += row.revenue_delta.abs();
        }
        segment.room_night_discrepancy_pct =
            discrepancy_pct(segment.abs_room_night_discrepancy, segment.ledger_room_nights);
        segment.revenue_discrepancy_pct =
            discrepancy_pct(segment.abs_revenue_discrepancy, segment.ledger_revenue);
        segment
    }

    /// `100 - room_night_discrepancy_pct`
    pub fn room_night_accuracy_pct(&self) -> Option<Decimal> {
        self.room_night_discrepancy_pct.map(|pct| HUNDRED - pct)
    }

    /// `100 - revenue_discrepancy_pct`
    pub fn revenue_accuracy_pct(&self) -> Option<Decimal> {
        self.revenue_discrepancy_pct.map(|pct| HUNDRED - pct)
    }
}

/// Discrepancy totals split at a cutoff date: past is strictly before it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracySummary {
    pub cutoff: Option<NaiveDate>,
    pub past: SegmentAccuracy,
    pub future: SegmentAccuracy,
}

impl AccuracySummary {
    pub fn compute(rows: &[ReconciledRow], today: NaiveDate) -> Self {
        Self {
            cutoff: Some(today),
            past: SegmentAccuracy::from_rows(rows.iter().filter(|r| r.date < today)),
            future: SegmentAccuracy::from_rows(rows.iter().filter(|r| r.date >= today)),
        }
    }
}

fn discrepancy_pct(discrepancy: Decimal, ledger_total: Decimal) -> Option<Decimal> {
    if ledger_total.is_zero() {
        return None;
    }
    discrepancy
        .checked_div(ledger_total)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
}
