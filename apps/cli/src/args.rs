use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use hfcheck_core::reconciliation::ReconcileMode;

#[derive(Debug, Parser)]
#[command(name = "hfcheck")]
#[command(
    about = "Compare OPERA Cloud revenue & inventory statistics with a Daily Totals ledger export",
    long_about = None
)]
pub struct Cli {
    /// JSON file with the "authentication" section
    #[arg(long)]
    pub config: PathBuf,

    /// OPERA hotel code
    #[arg(long)]
    pub hotel_id: String,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Semicolon-delimited ledger export
    #[arg(long)]
    pub ledger: PathBuf,

    /// Day-by-day rows or past/future totals only
    #[arg(long, value_enum, default_value_t = Mode::Daily)]
    pub mode: Mode,

    /// Print every matched day, not only the ones with a discrepancy
    #[arg(long)]
    pub all_rows: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Cutoff between past and future figures (defaults to the local date)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Day-by-day comparison
    Daily,
    /// Past/future totals only
    Totals,
}

impl From<Mode> for ReconcileMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Daily => ReconcileMode::Daily,
            Mode::Totals => ReconcileMode::Totals,
        }
    }
}
