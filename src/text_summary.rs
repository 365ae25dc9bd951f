//! Text summary builder for CLI output.
//!
//! This module formats human-readable lines for text mode.

use crate::model::{LatencySummary, SessionReport};

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

fn ms(v: Option<u64>) -> String {
    v.map(|v| format!("{v}")).unwrap_or_else(|| "-".into())
}

fn latency_line(l: &LatencySummary) -> String {
    format!(
        "Latency:    min {} p50 {} p90 {} p99 {} max {} ms ({} samples)",
        ms(l.min_ms),
        ms(l.p50_ms),
        ms(l.p90_ms),
        ms(l.p99_ms),
        ms(l.max_ms),
        l.samples
    )
}

/// Build a text summary from a finished session report.
pub fn build_text_summary(report: &SessionReport) -> TextSummary {
    let mut lines = Vec::new();
    lines.push(format!("Target:     {}", report.target));
    let status = if report.cancelled { " (cancelled)" } else { "" };
    lines.push(format!(
        "Operations: {}/{} completed{status}, {} ok, {} failed, {} silent",
        report.completed, report.planned, report.succeeded, report.failed, report.silent
    ));
    lines.push(latency_line(&report.latency));

    let ind = &report.indicator;
    lines.push(format!(
        "Indicator:  shown {}x, visible {}, {} flicker(s) suppressed",
        ind.shows,
        humantime::format_duration(ind.visible_total),
        ind.suppressed_flickers
    ));
    if ind.unmatched_ends > 0 {
        lines.push(format!(
            "Warning:    {} end() call(s) without a matching begin()",
            ind.unmatched_ends
        ));
    }

    TextSummary { lines }
}
