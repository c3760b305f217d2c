//! Chart rendering.
//!
//! The pipeline only knows the [`Renderer`] trait; [`SvgChartRenderer`] is the
//! implementation used by the binary.

pub mod chart;

pub use chart::SvgChartRenderer;

use crate::domain::{Artifact, TitleReport};
use crate::error::AppError;

pub trait Renderer: Sync {
    fn render(&self, report: &TitleReport) -> Result<Artifact, AppError>;
}

/// File stem for a title: ASCII alphanumerics, `-` and `_` are kept, anything
/// else becomes `_`.
pub fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "chart".to_string() } else { stem }
}
