//! Reporting: trend summaries and formatted terminal output.

pub mod format;
pub mod summary;

pub use format::*;
pub use summary::*;
