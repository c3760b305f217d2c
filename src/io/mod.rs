//! Input/output helpers.
//!
//! - run summary export (JSON) (`export`)

pub mod export;

pub use export::*;
