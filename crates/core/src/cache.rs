//! In-process cache of retrieved statistics.
//!
//! Entries are keyed by hotel, date range and credential fingerprint, so a
//! changed credential set or range never reuses another fetch. Nothing is
//! written to disk.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::credentials::Credentials;
use crate::dates::DateWindow;
use crate::stats::JobResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub hotel_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub credential_fingerprint: String,
}

impl FetchKey {
    pub fn new(hotel_id: &str, range: DateWindow, credentials: &Credentials) -> Self {
        Self {
            hotel_id: hotel_id.to_string(),
            start: range.start,
            end: range.end,
            credential_fingerprint: credentials.fingerprint(),
        }
    }
}

/// A complete retrieval: the windows it ran and their job results, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedFetch {
    pub windows: Vec<DateWindow>,
    pub job_results: Vec<JobResult>,
}

/// Thread-safe map from [`FetchKey`] to a complete retrieval.
#[derive(Debug, Default)]
pub struct FetchCache {
    entries: RwLock<HashMap<FetchKey, CachedFetch>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FetchKey) -> Option<CachedFetch> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    pub fn insert(&self, key: FetchKey, fetch: CachedFetch) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, fetch);
        }
    }

    /// Removes one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &FetchKey) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Removes every entry for a hotel, whatever the range or credentials.
    pub fn invalidate_hotel(&self, hotel_id: &str) -> usize {
        self.entries
            .write()
            .map(|mut entries| {
                let before = entries.len();
                entries.retain(|key, _| key.hotel_id != hotel_id);
                before - entries.len()
            })
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
