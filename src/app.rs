//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into a `PipelineConfig`
//! - fetches the datasets and renders one chart per title
//! - prints the summary table and writes the optional export
//! - opens the charts and reference pages in a browser

use chrono::{Days, Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::Cli;
use crate::data::{EpistatClient, Fetcher, LocalDirFetcher};
use crate::domain::{PipelineConfig, REFERENCE_URLS, TrimConfig, default_catalog};
use crate::error::AppError;
use crate::launch::{BrowserLauncher, Launcher};
use crate::plot::SvgChartRenderer;

pub mod pipeline;

/// Entry point for the `epi` binary.
pub fn run() -> Result<(), AppError> {
    // Load .env in local setups; a missing file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let today = Local::now().date_naive();
    let config = pipeline_config_from_args(&cli, today)?;

    let fetcher: Box<dyn Fetcher> = match &cli.data_dir {
        Some(dir) => Box::new(LocalDirFetcher::new(dir)),
        None => Box::new(EpistatClient::from_env()?),
    };
    let renderer = SvgChartRenderer::new(&config.output_folder);

    let specs = default_catalog();
    let run = pipeline::run_pipeline(&specs, &config, fetcher.as_ref(), &renderer)?;

    println!("{}", crate::report::format_run_summary(&run.outcomes, &config));

    if let Some(path) = &cli.export_summary {
        crate::io::write_summary_json(path, &run.outcomes, &config)?;
    }

    if !cli.no_open {
        let launcher = match &cli.browser {
            Some(browser) => BrowserLauncher::new(browser),
            None => BrowserLauncher::from_env(),
        };
        launcher.open(&open_targets(&run.pages()));
    }

    Ok(())
}

/// Compact logs on stderr; `RUST_LOG` overrides the default level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("epi_trends=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Build and validate the run configuration. `today` is passed in so the
/// result depends on nothing but its inputs.
///
/// The reporting lag only moves the end date of lagged metrics; the others
/// run up to `today`.
pub fn pipeline_config_from_args(cli: &Cli, today: NaiveDate) -> Result<PipelineConfig, AppError> {
    let lag = cli.reporting_lag_days;
    let lagged_end_date = today.checked_sub_days(Days::new(u64::from(lag))).ok_or_else(|| {
        AppError::usage(format!("Reporting lag of {lag} days reaches before the earliest supported date."))
    })?;
    if cli.start_date >= lagged_end_date {
        return Err(AppError::usage(format!(
            "Start date {} must be before the end date {lagged_end_date}.",
            cli.start_date
        )));
    }
    if cli.window == 0 {
        return Err(AppError::usage("Smoothing window must be at least 1 day."));
    }
    let trim = TrimConfig::new(cli.trim_lookback, cli.trim_ratio)?;

    let province = cli
        .province
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    Ok(PipelineConfig {
        start_date: cli.start_date,
        end_date: today,
        lagged_end_date,
        province,
        output_folder: cli.output_folder.clone(),
        window: cli.window,
        trim,
    })
}

/// Chart pages first, then the reference pages.
pub fn open_targets(pages: &[String]) -> Vec<String> {
    pages
        .iter()
        .cloned()
        .chain(REFERENCE_URLS.iter().map(|u| u.to_string()))
        .collect()
}
