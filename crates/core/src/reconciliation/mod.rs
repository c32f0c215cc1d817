//! Reconciliation module - joins API statistics with the ledger and scores
//! the differences.

mod accuracy;
mod reconciliation_model;
mod reconciliation_service;


pub use accuracy::{AccuracySummary, SegmentAccuracy};
pub use reconciliation_model::{
    Anomaly, AnomalyKind, ReconcileMode, ReconcileReport, ReconciledRow,
};
pub use reconciliation_service::{detect_anomalies, reconcile, ReconciliationEngine};
