//! Sciensano epistat integration.
//!
//! Datasets are published as one JSON array per name at
//! `{base}/COVID19BE_{name}.json`. Each element is a flat object with a `DATE`,
//! an optional `PROVINCE`, a few other labels, and integer counters. Each
//! element becomes one [`DatasetRecord`] holding all of its counters, so a
//! single download serves every metric of the dataset.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::data::Fetcher;
use crate::domain::DatasetRecord;
use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://epistat.sciensano.be/Data";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DATE_FIELD: &str = "DATE";
const REGION_FIELD: &str = "PROVINCE";

pub fn dataset_file_name(dataset: &str) -> String {
    format!("COVID19BE_{dataset}.json")
}

pub struct EpistatClient {
    client: Client,
    base_url: String,
}

impl EpistatClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::usage(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from `EPISTAT_BASE_URL` / `EPI_HTTP_TIMEOUT_SECS`, falling back
    /// to the public endpoint and a 60 s timeout.
    pub fn from_env() -> Result<Self, AppError> {
        let base_url = std::env::var("EPISTAT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = match std::env::var("EPI_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| AppError::usage(format!("Invalid EPI_HTTP_TIMEOUT_SECS '{raw}'.")))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn dataset_url(&self, dataset: &str) -> String {
        format!("{}/{}", self.base_url, dataset_file_name(dataset))
    }
}

impl Fetcher for EpistatClient {
    fn fetch(&self, dataset: &str) -> Result<Option<Vec<DatasetRecord>>, AppError> {
        let url = self.dataset_url(dataset);
        info!(dataset, %url, "fetching dataset");

        let resp = match self.client.get(&url).send() {
            Ok(resp) => resp,
            Err(e) => {
                warn!(dataset, error = %e, "dataset request failed");
                return Ok(None);
            }
        };

        if !resp.status().is_success() {
            warn!(dataset, status = %resp.status(), "dataset not available");
            return Ok(None);
        }

        let body = match resp.text() {
            Ok(body) => body,
            Err(e) => {
                warn!(dataset, error = %e, "failed to read dataset body");
                return Ok(None);
            }
        };

        let records = parse_dataset(&body)
            .map_err(|e| AppError::data(format!("Dataset '{dataset}': {e}")))?;
        info!(dataset, records = records.len(), "dataset fetched");
        Ok(Some(records))
    }
}

/// Parse an epistat JSON payload into dataset records.
///
/// A field is a counter when it holds an integer in at least one record.
/// Counters must be integers wherever they appear: a `null`, a float or a
/// string in a counter field is an error, as is a payload that is not an array
/// of objects or a record without a valid `DATE`. Fields that never hold an
/// integer are labels and are ignored.
pub fn parse_dataset(body: &str) -> Result<Vec<DatasetRecord>, AppError> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| AppError::data(format!("Invalid JSON payload: {e}")))?;
    let Value::Array(rows) = root else {
        return Err(AppError::data("Expected a JSON array of records."));
    };

    let mut objects = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let Value::Object(fields) = row else {
            return Err(AppError::data(format!("Record {idx} is not an object.")));
        };
        objects.push(fields);
    }

    let counter_keys: BTreeSet<&str> = objects
        .iter()
        .flat_map(|fields| fields.iter())
        .filter(|(key, value)| !is_reserved(key) && value.is_i64())
        .map(|(key, _)| key.as_str())
        .collect();

    objects
        .iter()
        .enumerate()
        .map(|(idx, fields)| -> Result<DatasetRecord, AppError> {
            let raw_date = fields
                .get(DATE_FIELD)
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::data(format!("Record {idx} has no {DATE_FIELD}.")))?;
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
                .map_err(|e| AppError::data(format!("Record {idx}: invalid date '{raw_date}': {e}")))?;
            let region = fields
                .get(REGION_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string);

            let mut counters = BTreeMap::new();
            for &key in &counter_keys {
                let Some(value) = fields.get(key) else {
                    continue;
                };
                let count = value.as_i64().ok_or_else(|| {
                    AppError::data(format!("Record {idx} ({raw_date}): {key} is {value}, expected an integer."))
                })?;
                counters.insert(key.to_string(), count);
            }

            Ok(DatasetRecord { date, region, counters })
        })
        .collect()
}

fn is_reserved(key: &str) -> bool {
    key == DATE_FIELD || key == REGION_FIELD
}
