//! Trend summary: recent percent change of the smoothed curve.
//!
//! The comparison points sit 4 and 11 days from the end. The last three
//! smoothed values are edge padding (a copy of the last full-window average),
//! so the point 4 from the end is the most recent genuinely centered average,
//! and the point 11 from the end is exactly one week before it.

use crate::domain::{SmoothedSeries, TrendSummary};
use crate::error::InsufficientData;

/// Offset from the end of the most recent compared point.
pub const RECENT_OFFSET: usize = 4;
/// Offset from the end of the earlier compared point.
pub const EARLIER_OFFSET: usize = 11;

/// Compute the trend summary of a smoothed curve.
pub fn summarize(smoothed: &[f64]) -> Result<TrendSummary, InsufficientData> {
    let n = smoothed.len();
    if n < EARLIER_OFFSET {
        return Err(InsufficientData::new("summary", EARLIER_OFFSET, n));
    }

    let recent = smoothed[n - RECENT_OFFSET];
    let earlier = smoothed[n - EARLIER_OFFSET];
    let ratio = recent / earlier;

    Ok(TrendSummary {
        last_value: recent.trunc() as i64,
        change_percent: ((ratio - 1.0) * 100.0).round_ties_even() as i64,
    })
}

pub fn summarize_series(smoothed: &SmoothedSeries) -> Result<TrendSummary, InsufficientData> {
    summarize(&smoothed.values)
}

/// Display form of the change: `+ 12%` for increases, `- 3%` otherwise.
///
/// No change renders as `- 0%`.
pub fn format_change(change_percent: i64) -> String {
    if change_percent > 0 {
        format!("+ {change_percent}%")
    } else {
        format!("- {}%", -change_percent)
    }
}

/// Chart heading, e.g. `Cases: 1234 (+ 12%)`.
pub fn chart_title(title: &str, summary: &TrendSummary) -> String {
    format!(
        "{}: {} ({})",
        capitalize(title),
        summary.last_value,
        format_change(summary.change_percent)
    )
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
