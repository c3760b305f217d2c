//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the fetch, analysis and render stages of one run
//! - exported to JSON as a run summary

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, InsufficientData};

/// One reported data point from an upstream dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    pub date: NaiveDate,
    /// `None` for rows that are already an all-regions aggregate.
    pub region: Option<String>,
    pub metric_key: String,
    pub value: i64,
}

/// One upstream row: its date, optional region, and every integer counter it carries.
///
/// Keeping the row intact (rather than only its samples) lets callers tell a
/// counter that is missing from a row apart from a row that was never there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub date: NaiveDate,
    pub region: Option<String>,
    pub counters: BTreeMap<String, i64>,
}

impl DatasetRecord {
    /// The sample for `metric_key`, if this row carries that counter.
    pub fn sample(&self, metric_key: &str) -> Option<RawSample> {
        self.counters.get(metric_key).map(|&value| RawSample {
            date: self.date,
            region: self.region.clone(),
            metric_key: metric_key.to_string(),
            value,
        })
    }
}

/// Date-ordered series with one value per date.
///
/// Dates are strictly increasing; construction goes through [`DateSeries::from_totals`]
/// (or [`DateSeries::from_points`], which sorts and sums duplicates).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DateSeries {
    /// Build from per-date totals. `BTreeMap` iteration order gives the ascending dates.
    pub fn from_totals(totals: BTreeMap<NaiveDate, f64>) -> Self {
        Self {
            points: totals.into_iter().collect(),
        }
    }

    /// Build from arbitrary `(date, value)` pairs, summing values sharing a date.
    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut totals = BTreeMap::new();
        for (date, value) in points {
            *totals.entry(date).or_insert(0.0) += value;
        }
        Self::from_totals(totals)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|(d, _)| *d).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    /// Value `offset` positions from the end (`1` is the last point).
    pub fn value_from_end(&self, offset: usize) -> Option<f64> {
        if offset == 0 || offset > self.points.len() {
            return None;
        }
        Some(self.points[self.points.len() - offset].1)
    }

    /// Remove and return the most recent point.
    pub fn pop_last(&mut self) -> Option<(NaiveDate, f64)> {
        self.points.pop()
    }
}

/// Moving-average trend aligned point-for-point with its source [`DateSeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    /// Window size used to compute the averages.
    pub window: usize,
}

impl SmoothedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(date, value)` pairs, in date order.
    pub fn points(&self) -> Vec<(NaiveDate, f64)> {
        self.dates.iter().copied().zip(self.values.iter().copied()).collect()
    }

    /// Point `offset` positions from the end (`1` is the last point).
    pub fn point_from_end(&self, offset: usize) -> Option<(NaiveDate, f64)> {
        if offset == 0 || offset > self.values.len() {
            return None;
        }
        let idx = self.values.len() - offset;
        Some((self.dates[idx], self.values[idx]))
    }
}

/// Recent change indicator derived from a smoothed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Smoothed value 4 points from the end, truncated toward zero.
    pub last_value: i64,
    /// Signed percent change between the points 11 and 4 from the end.
    pub change_percent: i64,
}

/// One chart to produce: which field of which dataset, and its display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub title: String,
    pub dataset: String,
    pub metric_key: String,
    /// Reported with a delay: the reporting lag applies to this metric.
    #[serde(default)]
    pub lagged: bool,
}

impl MetricSpec {
    pub fn new(title: impl Into<String>, dataset: impl Into<String>, metric_key: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset: dataset.into(),
            metric_key: metric_key.into(),
            lagged: false,
        }
    }

    pub fn lagged(mut self) -> Self {
        self.lagged = true;
        self
    }
}

/// The charts produced when nothing else is requested.
///
/// Test results trickle in over several days; hospital figures are complete
/// on publication.
pub fn default_catalog() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new("cases", "tests", "TESTS_ALL_POS").lagged(),
        MetricSpec::new("hospitalisations", "HOSP", "NEW_IN"),
        MetricSpec::new("ICU", "HOSP", "TOTAL_IN_ICU"),
    ]
}

/// Reference pages opened next to the rendered charts.
pub const REFERENCE_URLS: [&str; 2] = [
    "https://covid-19.sciensano.be/sites/default/files/Covid19/Meest%20recente%20update.pdf",
    "https://covid-vaccinatie.be/en",
];

/// Trailing-drop heuristic used to discard incomplete recent reports.
///
/// The last point is dropped while the value `lookback` points from the end is
/// more than `max_drop_ratio` times the last value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimConfig {
    pub lookback: usize,
    pub max_drop_ratio: f64,
}

impl TrimConfig {
    pub fn new(lookback: usize, max_drop_ratio: f64) -> Result<Self, AppError> {
        if lookback == 0 {
            return Err(AppError::usage("Trim lookback must be at least 1."));
        }
        if !(max_drop_ratio.is_finite() && max_drop_ratio > 0.0) {
            return Err(AppError::usage("Trim ratio must be a positive number."));
        }
        Ok(Self {
            lookback,
            max_drop_ratio,
        })
    }
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            lookback: 8,
            max_drop_ratio: 10.0,
        }
    }
}

/// Default smoothing window: one calendar week cancels weekly reporting cycles.
pub const DEFAULT_WINDOW: usize = 7;

/// Everything one pipeline run needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Exclusive lower bound on sample dates.
    pub start_date: NaiveDate,
    /// Exclusive upper bound on sample dates (today).
    pub end_date: NaiveDate,
    /// Exclusive upper bound for lagged metrics (today minus the reporting lag).
    pub lagged_end_date: NaiveDate,
    pub province: Option<String>,
    pub output_folder: PathBuf,
    pub window: usize,
    pub trim: TrimConfig,
}

impl PipelineConfig {
    /// Upper date bound for one metric.
    pub fn end_date_for(&self, spec: &MetricSpec) -> NaiveDate {
        if spec.lagged { self.lagged_end_date } else { self.end_date }
    }
}

/// Fully analyzed title, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleReport {
    pub spec: MetricSpec,
    pub raw: DateSeries,
    pub smoothed: SmoothedSeries,
    pub summary: TrendSummary,
    /// Number of trailing points discarded as incomplete.
    pub trimmed: usize,
}

/// Files written for one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub image: PathBuf,
    pub page: PathBuf,
}

/// What happened to one requested title.
#[derive(Debug, Clone)]
pub enum TitleOutcome {
    Rendered {
        report: TitleReport,
        artifact: Artifact,
    },
    /// The dataset the title depends on could not be fetched.
    Unavailable {
        title: String,
        dataset: String,
    },
    Insufficient {
        title: String,
        error: InsufficientData,
    },
}

impl TitleOutcome {
    pub fn title(&self) -> &str {
        match self {
            TitleOutcome::Rendered { report, .. } => &report.spec.title,
            TitleOutcome::Unavailable { title, .. } => title,
            TitleOutcome::Insufficient { title, .. } => title,
        }
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            TitleOutcome::Rendered { artifact, .. } => Some(artifact),
            _ => None,
        }
    }
}
