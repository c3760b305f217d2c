//! Formatted terminal output for a run.
//!
//! We keep formatting code in one place so output changes are localized and the
//! analysis code stays free of presentation concerns.

use crate::domain::{PipelineConfig, TitleOutcome};
use crate::report::summary::format_change;

/// Format the run header and the per-title table.
pub fn format_run_summary(outcomes: &[TitleOutcome], config: &PipelineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== epi - pandemic trend charts ===\n");
    out.push_str(&format!(
        "Range: ({}, {}) exclusive\n",
        config.start_date, config.end_date
    ));
    if config.lagged_end_date != config.end_date {
        out.push_str(&format!("Lagged metrics end: {}\n", config.lagged_end_date));
    }
    out.push_str(&format!(
        "Region: {}\n",
        config.province.as_deref().unwrap_or("all")
    ));
    out.push_str(&format!(
        "Smoothing: {}-day window | trim: lookback={} ratio>{}\n",
        config.window, config.trim.lookback, config.trim.max_drop_ratio
    ));
    out.push_str(&format!("Output: {}\n\n", config.output_folder.display()));

    out.push_str(&format_table(outcomes));
    out
}

fn format_table(outcomes: &[TitleOutcome]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:>10} {:>8} {:>7} {:>7} {:<12}",
            "title", "value", "change", "points", "trimmed", "last date"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<20} {:-<10} {:-<8} {:-<7} {:-<7} {:-<12}",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for outcome in outcomes {
        let line = match outcome {
            TitleOutcome::Rendered { report, .. } => format!(
                "{:<20} {:>10} {:>8} {:>7} {:>7} {:<12}",
                truncate(&report.spec.title, 20),
                report.summary.last_value,
                format_change(report.summary.change_percent),
                report.raw.len(),
                report.trimmed,
                report
                    .raw
                    .last_date()
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ),
            TitleOutcome::Unavailable { title, dataset } => format!(
                "{:<20} not available (dataset {dataset})",
                truncate(title, 20)
            ),
            TitleOutcome::Insufficient { title, error } => {
                format!("{:<20} skipped: {error}", truncate(title, 20))
            }
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
