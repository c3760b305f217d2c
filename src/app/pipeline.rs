//! The trend pipeline shared by the CLI and the integration tests.
//!
//! Per title: filter -> trim incomplete tail -> smooth -> summarize -> render.
//!
//! Titles must map to distinct chart files; a clash is rejected before any
//! network or disk access.
//!
//! Datasets are fetched once each, in parallel, before any title is analyzed.
//! Titles are then processed in parallel as well; they only share borrowed,
//! immutable data.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::Fetcher;
use crate::domain::{DatasetRecord, MetricSpec, PipelineConfig, RawSample, TitleOutcome, TitleReport};
use crate::error::{AppError, InsufficientData};
use crate::plot::{Renderer, file_stem};
use crate::report::summary::summarize_series;
use crate::series::{filter_records, metric_samples, smooth_series, trim_abnormal_tail};

/// All outcomes of one run, in the order the titles were requested.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub outcomes: Vec<TitleOutcome>,
}

impl RunOutput {
    /// Pages written by this run, in title order.
    pub fn pages(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(TitleOutcome::artifact)
            .map(|a| a.page.display().to_string())
            .collect()
    }
}

/// Fetch every dataset needed by `specs` and render one chart per title.
///
/// Unavailable datasets and titles with too little data are reported in the
/// output; clashing titles, malformed payloads and output failures abort the run.
pub fn run_pipeline(
    specs: &[MetricSpec],
    config: &PipelineConfig,
    fetcher: &dyn Fetcher,
    renderer: &dyn Renderer,
) -> Result<RunOutput, AppError> {
    check_distinct_stems(specs)?;
    let datasets = fetch_datasets(specs, fetcher)?;

    let outcomes = specs
        .par_iter()
        .map(|spec| {
            let records = datasets.get(&spec.dataset).and_then(Option::as_deref);
            process_title(spec, records, config, renderer)
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(RunOutput { outcomes })
}

/// Reject titles whose chart files would overwrite each other.
///
/// Stems are compared case-insensitively so the check also holds on
/// case-insensitive filesystems.
pub fn check_distinct_stems(specs: &[MetricSpec]) -> Result<(), AppError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for spec in specs {
        let stem = file_stem(&spec.title);
        match seen.entry(stem.to_lowercase()) {
            Entry::Occupied(first) => {
                return Err(AppError::usage(format!(
                    "Titles '{}' and '{}' would both be written as '{stem}'.",
                    first.get(),
                    spec.title
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(&spec.title);
            }
        }
    }
    Ok(())
}

/// Fetch each distinct dataset once. Returns when every fetch has finished.
pub fn fetch_datasets(
    specs: &[MetricSpec],
    fetcher: &dyn Fetcher,
) -> Result<HashMap<String, Option<Vec<DatasetRecord>>>, AppError> {
    let mut names: Vec<&str> = Vec::new();
    for spec in specs {
        if !names.contains(&spec.dataset.as_str()) {
            names.push(&spec.dataset);
        }
    }

    names
        .par_iter()
        .map(|&name| fetcher.fetch(name).map(|records| (name.to_string(), records)))
        .collect()
}

fn process_title(
    spec: &MetricSpec,
    records: Option<&[DatasetRecord]>,
    config: &PipelineConfig,
    renderer: &dyn Renderer,
) -> Result<TitleOutcome, AppError> {
    let Some(records) = records else {
        warn!(title = %spec.title, dataset = %spec.dataset, "not available");
        return Ok(TitleOutcome::Unavailable {
            title: spec.title.clone(),
            dataset: spec.dataset.clone(),
        });
    };

    let samples = metric_samples(
        records,
        &spec.metric_key,
        config.start_date,
        config.end_date_for(spec),
        config.province.as_deref(),
    )
    .map_err(|e| AppError::data(format!("Dataset '{}': {e}", spec.dataset)))?;

    let report = match analyze(&samples, spec, config) {
        Ok(report) => report,
        Err(error) => {
            warn!(title = %spec.title, %error, "skipping title");
            return Ok(TitleOutcome::Insufficient {
                title: spec.title.clone(),
                error,
            });
        }
    };

    let artifact = renderer.render(&report)?;
    Ok(TitleOutcome::Rendered { report, artifact })
}

/// Analyze one title without any I/O.
pub fn analyze(
    records: &[RawSample],
    spec: &MetricSpec,
    config: &PipelineConfig,
) -> Result<TitleReport, InsufficientData> {
    let mut raw = filter_records(
        records,
        &spec.metric_key,
        config.start_date,
        config.end_date_for(spec),
        config.province.as_deref(),
    );
    let trimmed = trim_abnormal_tail(&mut raw, &config.trim);
    let smoothed = smooth_series(&raw, config.window)?;
    let summary = summarize_series(&smoothed)?;

    info!(
        title = %spec.title,
        points = raw.len(),
        trimmed,
        last_value = summary.last_value,
        change_percent = summary.change_percent,
        "title analyzed"
    );

    Ok(TitleReport {
        spec: spec.clone(),
        raw,
        smoothed,
        summary,
        trimmed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use chrono::{Duration, NaiveDate};

    use crate::domain::{Artifact, TrimConfig};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap() + Duration::days(offset)
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            start_date: day(-1),
            end_date: day(100),
            lagged_end_date: day(100),
            province: None,
            output_folder: PathBuf::from("unused"),
            window: 7,
            trim: TrimConfig::default(),
        }
    }

    fn samples(key: &str, values: &[i64]) -> Vec<RawSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| RawSample {
                date: day(i as i64),
                region: None,
                metric_key: key.to_string(),
                value,
            })
            .collect()
    }

    fn records(key: &str, values: &[i64]) -> Vec<DatasetRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| DatasetRecord {
                date: day(i as i64),
                region: None,
                counters: [(key.to_string(), value)].into_iter().collect(),
            })
            .collect()
    }

    struct CountingFetcher {
        calls: Mutex<Vec<String>>,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, dataset: &str) -> Result<Option<Vec<DatasetRecord>>, AppError> {
            self.calls.lock().unwrap().push(dataset.to_string());
            Ok(Some(records("K", &[1; 20])))
        }
    }

    /// Serves a fixed record list for every dataset.
    struct FixedFetcher(Vec<DatasetRecord>);

    impl Fetcher for FixedFetcher {
        fn fetch(&self, _dataset: &str) -> Result<Option<Vec<DatasetRecord>>, AppError> {
            Ok(Some(self.0.clone()))
        }
    }

    struct NoRender;

    impl Renderer for NoRender {
        fn render(&self, report: &TitleReport) -> Result<Artifact, AppError> {
            Ok(Artifact {
                image: PathBuf::from(format!("{}.svg", report.spec.title)),
                page: PathBuf::from(format!("{}.html", report.spec.title)),
            })
        }
    }

    #[test]
    fn analyze_linear_growth() {
        let values: Vec<i64> = (1..=20).collect();
        let spec = MetricSpec::new("cases", "tests", "K");
        let report = analyze(&samples("K", &values), &spec, &config()).unwrap();

        assert_eq!(report.raw.len(), 20);
        assert_eq!(report.trimmed, 0);
        assert_eq!(report.smoothed.len(), 20);
        // Full-window averages of 1..=20 are 4..=17; offsets -4 and -11 hit 17 and 10.
        assert_eq!(report.summary.last_value, 17);
        assert_eq!(report.summary.change_percent, 70);
    }

    #[test]
    fn analyze_trims_before_smoothing() {
        let mut values = vec![100; 15];
        values.push(1);
        let spec = MetricSpec::new("cases", "tests", "K");
        let report = analyze(&samples("K", &values), &spec, &config()).unwrap();
        assert_eq!(report.trimmed, 1);
        assert_eq!(report.raw.len(), 15);
        assert_eq!(report.summary.change_percent, 0);
        assert_eq!(report.summary.last_value, 100);
    }

    #[test]
    fn analyze_reports_insufficient_data() {
        let spec = MetricSpec::new("cases", "tests", "K");

        let err = analyze(&samples("K", &[5; 5]), &spec, &config()).unwrap_err();
        assert_eq!(err, InsufficientData::new("smoothing", 7, 5));

        let err = analyze(&samples("K", &[5; 9]), &spec, &config()).unwrap_err();
        assert_eq!(err, InsufficientData::new("summary", 11, 9));
    }

    #[test]
    fn analyze_is_deterministic() {
        let values: Vec<i64> = (0..40).map(|i| 50 + (i * 37) % 23).collect();
        let spec = MetricSpec::new("cases", "tests", "K");
        let records = samples("K", &values);
        let a = analyze(&records, &spec, &config()).unwrap();
        let b = analyze(&records, &spec, &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn reporting_lag_applies_to_lagged_metrics_only() {
        let values: Vec<i64> = (1..=20).collect();
        let mut config = config();
        config.end_date = day(20);
        config.lagged_end_date = day(17);

        let hosp = MetricSpec::new("hospitalisations", "HOSP", "K");
        let report = analyze(&samples("K", &values), &hosp, &config).unwrap();
        assert_eq!(report.raw.len(), 20);

        let cases = MetricSpec::new("cases", "tests", "K").lagged();
        let report = analyze(&samples("K", &values), &cases, &config).unwrap();
        assert_eq!(report.raw.len(), 17);
        assert_eq!(report.raw.last_date(), Some(day(16)));
    }

    #[test]
    fn missing_counter_inside_window_aborts_the_run() {
        let mut data = records("K", &[5; 20]);
        data[10].counters.clear();
        let specs = vec![MetricSpec::new("cases", "tests", "K")];

        let err = run_pipeline(&specs, &config(), &FixedFetcher(data), &NoRender).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
        assert!(err.to_string().contains("2021-01-11"));
    }

    #[test]
    fn missing_counter_outside_window_is_ignored() {
        let mut data = records("K", &[5; 20]);
        data[0].counters.clear();
        let mut config = config();
        config.start_date = day(0);
        let specs = vec![MetricSpec::new("cases", "tests", "K")];

        let out = run_pipeline(&specs, &config, &FixedFetcher(data), &NoRender).unwrap();
        match &out.outcomes[0] {
            TitleOutcome::Rendered { report, .. } => assert_eq!(report.raw.len(), 19),
            other => panic!("expected rendered, got {other:?}"),
        }
    }

    #[test]
    fn titles_sharing_a_file_stem_are_rejected_before_fetching() {
        let fetcher = CountingFetcher::new();
        for pair in [["a b", "a_b"], ["ICU", "icu"], ["x", "x"]] {
            let specs: Vec<_> = pair.iter().map(|t| MetricSpec::new(*t, "HOSP", "K")).collect();
            let err = run_pipeline(&specs, &config(), &fetcher, &NoRender).unwrap_err();
            assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
        }
        assert!(fetcher.calls.lock().unwrap().is_empty());

        let specs = vec![MetricSpec::new("a-b", "HOSP", "K"), MetricSpec::new("a_b", "HOSP", "K")];
        assert!(check_distinct_stems(&specs).is_ok());
    }

    #[test]
    fn shared_datasets_are_fetched_once() {
        let fetcher = CountingFetcher::new();
        let specs = vec![
            MetricSpec::new("a", "HOSP", "K"),
            MetricSpec::new("b", "tests", "K"),
            MetricSpec::new("c", "HOSP", "K"),
        ];

        let out = run_pipeline(&specs, &config(), &fetcher, &NoRender).unwrap();

        let mut calls = fetcher.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["HOSP".to_string(), "tests".to_string()]);

        let titles: Vec<&str> = out.outcomes.iter().map(TitleOutcome::title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(out.pages(), vec!["a.html", "b.html", "c.html"]);
    }
}
