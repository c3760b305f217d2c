//! Group raw samples into a per-date series.
//!
//! Upstream datasets report one row per (date, province, ...) breakdown, so a
//! national figure is the sum of every row sharing a date. Dates whose total is
//! not positive carry no usable signal (and would break the ratios computed
//! downstream), so they are dropped here.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{DatasetRecord, DateSeries, RawSample};
use crate::error::AppError;

/// Samples of `metric_key` from dataset records.
///
/// Every record inside the window (`start < date < end`, and in `region` when
/// one is given) must carry the counter: a gap there would silently lower the
/// date's total, so it is a data error. Records outside the window may lack it.
pub fn metric_samples(
    records: &[DatasetRecord],
    metric_key: &str,
    start: NaiveDate,
    end: NaiveDate,
    region: Option<&str>,
) -> Result<Vec<RawSample>, AppError> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        match record.sample(metric_key) {
            Some(sample) => out.push(sample),
            None => {
                let in_window = start < record.date && record.date < end;
                let in_region = region.is_none_or(|r| record.region.as_deref() == Some(r));
                if in_window && in_region {
                    return Err(AppError::data(format!(
                        "Record for {}{} has no {metric_key}.",
                        record.date,
                        record.region.as_deref().map(|r| format!(" ({r})")).unwrap_or_default()
                    )));
                }
            }
        }
    }
    Ok(out)
}

/// Build the date series for `metric_key` from raw samples.
///
/// A sample is kept when its metric key matches, `start < date < end` (both
/// bounds exclusive), and it belongs to `region` when one is given. The result
/// is sorted by date whatever the input order.
pub fn filter_records(
    records: &[RawSample],
    metric_key: &str,
    start: NaiveDate,
    end: NaiveDate,
    region: Option<&str>,
) -> DateSeries {
    let mut totals: BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for sample in records {
        if sample.metric_key != metric_key {
            continue;
        }
        if !(start < sample.date && sample.date < end) {
            continue;
        }
        if let Some(region) = region {
            if sample.region.as_deref() != Some(region) {
                continue;
            }
        }
        *totals.entry(sample.date).or_insert(0) += sample.value;
    }

    DateSeries::from_totals(
        totals
            .into_iter()
            .filter(|&(_, total)| total > 0)
            .map(|(date, total)| (date, total as f64))
            .collect(),
    )
}
