//! `epi-trends` library crate.
//!
//! The binary (`epi`) is a thin wrapper around this library so that:
//!
//! - the aggregation and smoothing core is testable without network or files
//! - fetchers, renderers and launchers can be swapped behind their traits
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod launch;
pub mod plot;
pub mod report;
pub mod series;
