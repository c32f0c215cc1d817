//! Text and JSON rendering of a reconciliation run.

use rust_decimal::Decimal;
use serde_json::json;
use std::fmt::{self, Write};

use hfcheck_core::reconciliation::{ReconcileMode, ReconcileReport, SegmentAccuracy};
use hfcheck_core::DateWindow;
use hfcheck_opera::RetrievalReport;

pub fn render_json(
    hotel_id: &str,
    range: DateWindow,
    retrieval: &RetrievalReport,
    report: &ReconcileReport,
) -> serde_json::Result<String> {
    let failures: Vec<_> = retrieval
        .failures
        .iter()
        .map(|f| json!({ "window": f.window, "error": f.error.to_string() }))
        .collect();

    serde_json::to_string_pretty(&json!({
        "hotelId": hotel_id,
        "range": range,
        "retrieval": {
            "completedWindows": retrieval.completed_windows,
            "failures": failures,
            "cancelled": retrieval.cancelled,
            "fromCache": retrieval.from_cache,
            "recordCount": retrieval.record_count(),
        },
        "report": report,
    }))
}

pub fn render_text(
    hotel_id: &str,
    range: DateWindow,
    retrieval: &RetrievalReport,
    report: &ReconcileReport,
    all_rows: bool,
) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "Hotel {} ({})", hotel_id, range)?;
    writeln!(
        out,
        "Retrieved {} window(s), {} failed, {} record(s){}",
        retrieval.completed_windows.len(),
        retrieval.failed_window_count(),
        retrieval.record_count(),
        if retrieval.from_cache { " [cached]" } else { "" }
    )?;
    for failure in &retrieval.failures {
        writeln!(out, "  window {} failed: {}", failure.window, failure.error)?;
    }
    if retrieval.cancelled {
        writeln!(out, "Retrieval was cancelled; results are partial.")?;
    }

    if let Some(notice) = &report.notice {
        writeln!(out, "\n{}", notice)?;
    }
    if report.is_empty() {
        return Ok(out);
    }

    if report.mode == ReconcileMode::Daily {
        write_rows(&mut out, report, all_rows)?;
    }

    writeln!(out)?;
    let cutoff = report
        .summary
        .cutoff
        .map(|d| d.to_string())
        .unwrap_or_default();
    write_segment(&mut out, &format!("Past (before {})", cutoff), &report.summary.past)?;
    write_segment(&mut out, &format!("Future (from {})", cutoff), &report.summary.future)?;

    if !report.anomalies.is_empty() {
        writeln!(out, "\nAnomalies:")?;
        for anomaly in &report.anomalies {
            writeln!(out, "  {}: {}", anomaly.date, anomaly.kind.describe())?;
        }
    }
    Ok(out)
}

fn write_rows(out: &mut String, report: &ReconcileReport, all_rows: bool) -> fmt::Result {
    let rows: Vec<_> = if all_rows {
        report.rows.iter().collect()
    } else {
        report.discrepancies().collect()
    };

    writeln!(
        out,
        "\n{} of {} matched day(s) {}",
        rows.len(),
        report.matched_count,
        if all_rows { "" } else { "with a discrepancy" }
    )?;
    if rows.is_empty() {
        return Ok(());
    }

    writeln!(
        out,
        "{:<10}  {:>10} {:>10} {:>8}  {:>12} {:>12} {:>10}",
        "date", "ledger rn", "api rn", "rn diff", "ledger rev", "api rev", "rev diff"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:<10}  {:>10} {:>10} {:>8}  {:>12.2} {:>12.2} {:>10.2}",
            row.date.to_string(),
            row.ledger_room_nights.normalize().to_string(),
            row.api_room_nights.normalize().to_string(),
            row.room_night_delta.normalize().to_string(),
            row.ledger_revenue,
            row.api_revenue,
            row.revenue_delta
        )?;
    }
    Ok(())
}

fn write_segment(out: &mut String, label: &str, segment: &SegmentAccuracy) -> fmt::Result {
    writeln!(out, "{}: {} day(s)", label, segment.row_count)?;
    if segment.row_count == 0 {
        return Ok(());
    }
    writeln!(
        out,
        "  room nights: ledger {}, |diff| {}, accuracy {}",
        segment.ledger_room_nights.normalize(),
        segment.abs_room_night_discrepancy.normalize(),
        percent(segment.room_night_accuracy_pct())
    )?;
    writeln!(
        out,
        "  revenue:     ledger {:.2}, |diff| {:.2}, accuracy {}",
        segment.ledger_revenue,
        segment.abs_revenue_discrepancy,
        percent(segment.revenue_accuracy_pct())
    )
}

fn percent(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2} %", v),
        None => "undefined".to_string(),
    }
}
