//! Post-run processing utilities.
//!
//! Turns a finished workload into a report and handles exports.

use super::controller::WorkloadRun;
use crate::client::Tracking;
use crate::indicator::CoordinatorMetrics;
use crate::metrics::latency_summary;
use crate::model::SessionReport;
use anyhow::{Context, Result};
use std::path::Path;

/// Result of post-run processing, ready for presentation layers.
pub struct ProcessedRun {
    pub report: SessionReport,
    pub export_messages: Vec<String>,
}

/// Build the report for a finished run.
pub fn build_report(target: String, run: &WorkloadRun, indicator: CoordinatorMetrics) -> SessionReport {
    let latencies: Vec<u64> = run.outcomes.iter().map(|o| o.elapsed_ms).collect();
    let succeeded = run.outcomes.iter().filter(|o| o.ok).count();
    SessionReport {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        target,
        planned: run.planned,
        completed: run.outcomes.len(),
        succeeded,
        failed: run.outcomes.len() - succeeded,
        silent: run
            .outcomes
            .iter()
            .filter(|o| o.tracking == Tracking::Silent)
            .count(),
        cancelled: run.cancelled,
        latency: latency_summary(&latencies),
        indicator,
    }
}

/// Build the report and write the JSON export when one was requested.
pub fn process_run_completion(
    target: String,
    run: &WorkloadRun,
    indicator: CoordinatorMetrics,
    export_json: Option<&Path>,
) -> ProcessedRun {
    let report = build_report(target, run, indicator);

    let mut export_messages = Vec::new();
    if let Some(path) = export_json {
        match export_report_json(path, &report) {
            Ok(()) => export_messages.push(format!("Exported JSON: {}", path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    ProcessedRun {
        report,
        export_messages,
    }
}

pub fn export_report_json(path: &Path, report: &SessionReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
