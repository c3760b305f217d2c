//! Command-line parsing for the trend chart tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline: flags are turned into a `PipelineConfig` in `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::domain::DEFAULT_WINDOW;

pub const DEFAULT_START_DATE: &str = "2020-11-01";

/// Top-level CLI.
#[derive(Debug, Parser, Clone)]
#[command(name = "epi", version, about = "Visualize the pandemic situation in Belgium")]
pub struct Cli {
    /// Start of the date range to visualize (exclusive).
    #[arg(long, value_name = "YYYY-MM-DD", default_value = DEFAULT_START_DATE, value_parser = parse_date)]
    pub start_date: NaiveDate,

    /// Only visualize the given province (e.g. WestVlaanderen).
    #[arg(long)]
    pub province: Option<String>,

    /// Folder for the rendered charts.
    #[arg(long, value_name = "PATH", default_value = "charts")]
    pub output_folder: PathBuf,

    /// Days of reporting lag: samples from the last N days (and today) are ignored.
    #[arg(long, default_value_t = 0)]
    pub reporting_lag_days: u32,

    /// Moving-average window (days).
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Compare the last point with the point this many days earlier when trimming.
    #[arg(long, default_value_t = 8)]
    pub trim_lookback: usize,

    /// Drop the last point while the earlier point exceeds it by more than this factor.
    #[arg(long, default_value_t = 10.0)]
    pub trim_ratio: f64,

    /// Read `COVID19BE_<name>.json` files from this folder instead of downloading.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Do not open the charts in a browser.
    #[arg(long)]
    pub no_open: bool,

    /// Browser binary used to open the charts (default: $EPI_BROWSER or chromium).
    #[arg(long)]
    pub browser: Option<String>,

    /// Write the per-title summaries to a JSON file.
    #[arg(long, value_name = "JSON")]
    pub export_summary: Option<PathBuf>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{raw}': {e}"))
}
