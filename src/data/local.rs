//! Read datasets from a local directory holding previously downloaded
//! `COVID19BE_{name}.json` files.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::data::{Fetcher, dataset_file_name, parse_dataset};
use crate::domain::DatasetRecord;
use crate::error::AppError;

pub struct LocalDirFetcher {
    dir: PathBuf,
}

impl LocalDirFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dataset_path(&self, dataset: &str) -> PathBuf {
        self.dir.join(dataset_file_name(dataset))
    }
}

impl Fetcher for LocalDirFetcher {
    fn fetch(&self, dataset: &str) -> Result<Option<Vec<DatasetRecord>>, AppError> {
        let path = self.dataset_path(dataset);
        let body = match std::fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) => {
                warn!(dataset, path = %path.display(), error = %e, "dataset file not readable");
                return Ok(None);
            }
        };

        let records = parse_dataset(&body)
            .map_err(|e| AppError::data(format!("Dataset file '{}': {e}", path.display())))?;
        info!(dataset, path = %path.display(), records = records.len(), "dataset loaded");
        Ok(Some(records))
    }
}
