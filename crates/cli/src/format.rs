//! Report → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): one summary block followed by a per-caller table
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use optimist_core::Error;

use crate::contend::ContendReport;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Format a finished contention run.
pub fn format_report(report: &ContendReport, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => format_json(report),
        OutputMode::Human => format_human(report),
    }
}

/// Format an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(&serde_json::json!({
            "error": format!("{}", err)
        }))
        .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", err)),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn format_json(report: &ContendReport) -> String {
    let value = serde_json::json!({
        "callers": report.callers,
        "increments": report.increments,
        "expected": report.expected,
        "committed": report.committed(),
        "failed": report.failed(),
        "attempts": report.attempts(),
        "consistent": report.is_consistent(),
        "record": report.record,
        "store": report.store,
        "elapsed_ms": report.elapsed_ms,
        "callers_detail": report.tallies,
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn format_human(report: &ContendReport) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "record {:?} at {}: counter = {} (expected {})",
        report.record.id.as_str(),
        report.record.version,
        report.record.payload.counter,
        report.expected
    ));
    lines.push(format!(
        "committed {} / failed {} / attempts {} in {}ms",
        report.committed(),
        report.failed(),
        report.attempts(),
        report.elapsed_ms
    ));
    lines.push(format!(
        "store: gets={} puts={} commits={} mismatches={}",
        report.store.gets, report.store.puts, report.store.commits, report.store.mismatches
    ));
    lines.push(String::new());
    lines.push(format!(
        "{:>6}  {:>9}  {:>6}  {:>8}  {:>12}",
        "caller", "committed", "failed", "attempts", "max attempts"
    ));
    for (i, tally) in report.tallies.iter().enumerate() {
        lines.push(format!(
            "{:>6}  {:>9}  {:>6}  {:>8}  {:>12}",
            i + 1,
            tally.committed,
            tally.failed,
            tally.attempts,
            tally.max_attempts
        ));
    }
    for (i, tally) in report.tallies.iter().enumerate() {
        for err in &tally.errors {
            lines.push(format!("(error) caller {}: {}", i + 1, err));
        }
    }
    lines.join("\n")
}
