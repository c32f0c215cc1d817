//! Date windows and the range splitter used to chunk statistics requests.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Error, Result};

/// Largest span the statistics endpoint accepts for a single job.
pub const DEFAULT_MAX_WINDOW_DAYS: u32 = 400;

/// Inclusive calendar date interval processed as one asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::invalid_range(start, end));
        }
        Ok(Self { start, end })
    }

    /// Number of calendar days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Splits `[start, end]` into ascending, contiguous windows of at most
/// `max_days` days each.
///
/// A single-day range yields exactly one window. The last window always ends
/// on `end`.
pub fn split_date_range(
    start: NaiveDate,
    end: NaiveDate,
    max_days: u32,
) -> Result<Vec<DateWindow>> {
    if start > end {
        return Err(Error::invalid_range(start, end));
    }
    if max_days == 0 {
        return Err(Error::InvalidRange(
            "maximum window length must be at least one day".to_string(),
        ));
    }

    let span = Duration::days(i64::from(max_days) - 1);
    let mut windows = Vec::new();
    let mut current = start;

    loop {
        let window_end = current
            .checked_add_signed(span)
            .map_or(end, |candidate| candidate.min(end));
        windows.push(DateWindow {
            start: current,
            end: window_end,
        });

        if window_end >= end {
            break;
        }
        current = window_end + Duration::days(1);
    }

    Ok(windows)
}
