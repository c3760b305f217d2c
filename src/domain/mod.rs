//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - upstream rows (`DatasetRecord`), samples (`RawSample`) and the series built from them
//!   (`DateSeries`, `SmoothedSeries`)
//! - the trend indicator (`TrendSummary`)
//! - run configuration (`PipelineConfig`, `TrimConfig`, `MetricSpec`)
//! - per-title results (`TitleReport`, `TitleOutcome`, `Artifact`)

pub mod types;

pub use types::*;
