//! Revenue & inventory statistics as returned by the asynchronous job results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One occupancy day reported by the API.
///
/// Fields the reconciliation does not use are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRecord {
    #[serde(deserialize_with = "deserialize_occupancy_date")]
    pub occupancy_date: NaiveDate,
    #[serde(default)]
    pub rooms_sold: Option<Decimal>,
    #[serde(default)]
    pub room_revenue: Option<Decimal>,
}

/// One element of a fetched job payload.
///
/// `stat_records` stays optional so that a payload missing the nested key can
/// be reported as a schema problem instead of failing the whole fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    #[serde(default)]
    pub hotel_id: Option<String>,
    #[serde(rename = "revInvStats", default)]
    pub stat_records: Option<Vec<StatRecord>>,
}

impl JobResult {
    pub fn new(hotel_id: Option<String>, stat_records: Vec<StatRecord>) -> Self {
        Self {
            hotel_id,
            stat_records: Some(stat_records),
        }
    }
}

/// Top-level body of a completed job fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsPayload {
    #[serde(rename = "revInvStats")]
    pub job_results: Vec<JobResult>,
}

/// Accepts `YYYY-MM-DD` with an optional time suffix.
fn deserialize_occupancy_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    crate::ledger::parse_calendar_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid occupancyDate '{}'", raw))
    })
}
