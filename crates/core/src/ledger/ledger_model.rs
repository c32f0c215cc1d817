use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One day of the ledger export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub arrival_date: NaiveDate,
    pub room_nights: Option<Decimal>,
    pub net_revenue: Option<Decimal>,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses a calendar date, dropping any time-of-day part.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            // Offsets such as "2024-01-01T00:00:00+01:00" keep their local date.
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parses a ledger cell. Blank cells are `Ok(None)`.
pub fn parse_ledger_number(raw: &str) -> Result<Option<Decimal>, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    match Decimal::from_str(value) {
        Ok(d) => Ok(Some(d)),
        Err(e_decimal) => Decimal::from_scientific(value)
            .map(Some)
            .map_err(|_| format!("'{}' is not a number ({})", value, e_decimal)),
    }
}
