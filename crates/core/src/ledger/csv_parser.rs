//! Ledger CSV parsing.
//!
//! The export is read whole: BOM stripped, header names trimmed, and the three
//! columns the reconciliation needs located by name.

use csv::{ReaderBuilder, Terminator};
use serde::{Deserialize, Serialize};

use super::ledger_model::{parse_calendar_date, parse_ledger_number, LedgerRow};
use crate::errors::{Error, Result};

/// Column names and delimiter of the ledger export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Field delimiter (default: ';')
    pub delimiter: u8,
    /// Date column (default: "arrivalDate")
    pub date_column: String,
    /// Room-nights column (default: "rn")
    pub room_nights_column: String,
    /// Net revenue column (default: "revNet")
    pub revenue_column: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            delimiter: b';',
            date_column: "arrivalDate".to_string(),
            room_nights_column: "rn".to_string(),
            revenue_column: "revNet".to_string(),
        }
    }
}

/// Parses the ledger export into rows, in file order.
pub fn parse_ledger(content: &[u8], config: &LedgerConfig) -> Result<Vec<LedgerRow>> {
    let content = strip_bom(content);

    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .terminator(Terminator::Any(b'\n'))
        .from_reader(content);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_end_matches('\r').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::file_format("ledger file is empty"));
    }

    let column = |name: &str| -> Result<usize> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::file_format(format!(
                "missing column '{}' (found: {})",
                name,
                headers.join(", ")
            ))
        })
    };
    let date_idx = column(&config.date_column)?;
    let rn_idx = column(&config.room_nights_column)?;
    let rev_idx = column(&config.revenue_column)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = idx + 1;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let cell = |i: usize| record.get(i).unwrap_or("").trim_end_matches('\r');

        let raw_date = cell(date_idx);
        let arrival_date = parse_calendar_date(raw_date).ok_or_else(|| {
            Error::file_format(format!(
                "row {}: invalid {} '{}'",
                line, config.date_column, raw_date
            ))
        })?;
        let room_nights = parse_ledger_number(cell(rn_idx)).map_err(|e| {
            Error::file_format(format!(
                "row {}: invalid {}: {}",
                line, config.room_nights_column, e
            ))
        })?;
        let net_revenue = parse_ledger_number(cell(rev_idx)).map_err(|e| {
            Error::file_format(format!(
                "row {}: invalid {}: {}",
                line, config.revenue_column, e
            ))
        })?;

        rows.push(LedgerRow {
            arrival_date,
            room_nights,
            net_revenue,
        });
    }

    log::debug!("Parsed {} ledger rows", rows.len());
    Ok(rows)
}

/// Drops a UTF-8 BOM (EF BB BF) if present.
fn strip_bom(content: &[u8]) -> &[u8] {
    content.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(content)
}
