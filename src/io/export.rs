//! Export per-title summaries to JSON.
//!
//! The export is meant to be easy to consume in downstream scripts: one entry
//! per requested title, with a `status` telling rendered titles apart from
//! unavailable or skipped ones.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{PipelineConfig, TitleOutcome};
use crate::error::AppError;
use crate::report::summary::format_change;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryFile {
    pub tool: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub lagged_end_date: NaiveDate,
    pub province: Option<String>,
    pub window: usize,
    pub titles: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SummaryEntry {
    Rendered {
        title: String,
        dataset: String,
        metric_key: String,
        last_value: i64,
        change_percent: i64,
        change: String,
        points: usize,
        trimmed: usize,
        first_date: Option<NaiveDate>,
        last_date: Option<NaiveDate>,
        page: PathBuf,
    },
    Unavailable {
        title: String,
        dataset: String,
    },
    Insufficient {
        title: String,
        reason: String,
    },
}

pub fn summary_file(outcomes: &[TitleOutcome], config: &PipelineConfig) -> SummaryFile {
    let titles = outcomes
        .iter()
        .map(|outcome| match outcome {
            TitleOutcome::Rendered { report, artifact } => SummaryEntry::Rendered {
                title: report.spec.title.clone(),
                dataset: report.spec.dataset.clone(),
                metric_key: report.spec.metric_key.clone(),
                last_value: report.summary.last_value,
                change_percent: report.summary.change_percent,
                change: format_change(report.summary.change_percent),
                points: report.raw.len(),
                trimmed: report.trimmed,
                first_date: report.raw.first_date(),
                last_date: report.raw.last_date(),
                page: artifact.page.clone(),
            },
            TitleOutcome::Unavailable { title, dataset } => SummaryEntry::Unavailable {
                title: title.clone(),
                dataset: dataset.clone(),
            },
            TitleOutcome::Insufficient { title, error } => SummaryEntry::Insufficient {
                title: title.clone(),
                reason: error.to_string(),
            },
        })
        .collect();

    SummaryFile {
        tool: "epi".to_string(),
        start_date: config.start_date,
        end_date: config.end_date,
        lagged_end_date: config.lagged_end_date,
        province: config.province.clone(),
        window: config.window,
        titles,
    }
}

/// Write the run summary JSON file.
pub fn write_summary_json(path: &Path, outcomes: &[TitleOutcome], config: &PipelineConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create summary JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &summary_file(outcomes, config))
        .map_err(|e| AppError::output(format!("Failed to write summary JSON: {e}")))?;

    Ok(())
}

/// Read a summary JSON file written by [`write_summary_json`].
pub fn read_summary_json(path: &Path) -> Result<SummaryFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open summary JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::data(format!("Invalid summary JSON: {e}")))
}
