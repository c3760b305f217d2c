//! Dataset sources.
//!
//! A [`Fetcher`] turns a dataset name into dataset records. "Absent" is a normal
//! outcome (`Ok(None)`): the run reports the titles depending on that dataset
//! as unavailable and carries on. `Err` is reserved for payloads that arrived
//! but cannot be trusted.

pub mod epistat;
pub mod local;

pub use epistat::{EpistatClient, dataset_file_name, parse_dataset};
pub use local::LocalDirFetcher;

use crate::domain::DatasetRecord;
use crate::error::AppError;

pub trait Fetcher: Sync {
    fn fetch(&self, dataset: &str) -> Result<Option<Vec<DatasetRecord>>, AppError>;
}
