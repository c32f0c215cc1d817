//! Ledger module - the "Daily Totals" export treated as ground truth.

mod csv_parser;
mod ledger_model;

pub use csv_parser::{parse_ledger, LedgerConfig};
pub use ledger_model::{parse_calendar_date, parse_ledger_number, LedgerRow};
