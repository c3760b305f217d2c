//! Plotters-powered trend chart written to SVG.
//!
//! One chart per title:
//! - raw daily values: thin green line
//! - smoothed trend: thick black line
//! - the two points compared by the trend summary: red dots
//! - logarithmic y axis with horizontal grid lines
//!
//! Next to the image we write a one-line HTML page embedding it at full width,
//! which is what gets opened in the browser.

use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use tracing::info;

use crate::domain::{Artifact, TitleReport};
use crate::error::AppError;
use crate::plot::{Renderer, file_stem};
use crate::report::summary::{EARLIER_OFFSET, RECENT_OFFSET, chart_title};

const DEFAULT_SIZE: (u32, u32) = (1900, 900);

pub struct SvgChartRenderer {
    output_folder: PathBuf,
    size: (u32, u32),
}

impl SvgChartRenderer {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
            size: DEFAULT_SIZE,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }
}

impl Renderer for SvgChartRenderer {
    fn render(&self, report: &TitleReport) -> Result<Artifact, AppError> {
        create_dir_all(&self.output_folder).map_err(|e| {
            AppError::output(format!(
                "Failed to create output folder '{}': {e}",
                self.output_folder.display()
            ))
        })?;

        let stem = file_stem(&report.spec.title);
        let image = self.output_folder.join(format!("{stem}.svg"));
        let page = self.output_folder.join(format!("{stem}.html"));

        draw_chart(&image, report, self.size).map_err(|e| {
            AppError::output(format!("Failed to draw chart '{}': {e}", image.display()))
        })?;

        write(&page, wrapper_page(&format!("{stem}.svg"))).map_err(|e| {
            AppError::output(format!("Failed to write chart page '{}': {e}", page.display()))
        })?;

        info!(title = %report.spec.title, page = %page.display(), "chart written");
        Ok(Artifact { image, page })
    }
}

/// Minimal page embedding the chart image at full width.
pub fn wrapper_page(image_name: &str) -> String {
    format!(r#"<img src="{image_name}" style="width:100%">"#)
}

fn draw_chart(path: &Path, report: &TitleReport, size: (u32, u32)) -> Result<(), Box<dyn std::error::Error>> {
    let raw = report.raw.points();
    let smoothed = report.smoothed.points();

    let (Some(first), Some(last)) = (report.raw.first_date(), report.raw.last_date()) else {
        return Err("empty series".into());
    };
    let (x0, x1) = date_bounds(first, last);
    let (y0, y1) = log_bounds(raw.iter().chain(smoothed.iter()).map(|&(_, v)| v)).ok_or("no positive values to plot")?;

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(chart_title(&report.spec.title, &report.summary), ("sans-serif", 28))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, (y0..y1).log_scale())?;

    // Only horizontal grid lines.
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(12)
        .y_labels(12)
        .x_label_formatter(&|d| d.format("%Y-%m-%d").to_string())
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    chart.draw_series(LineSeries::new(raw.iter().copied(), GREEN.stroke_width(1)))?;
    chart.draw_series(LineSeries::new(smoothed.iter().copied(), BLACK.stroke_width(3)))?;

    let markers: Vec<(NaiveDate, f64)> = [RECENT_OFFSET, EARLIER_OFFSET]
        .into_iter()
        .filter_map(|offset| report.smoothed.point_from_end(offset))
        .collect();
    chart.draw_series(markers.into_iter().map(|p| Circle::new(p, 6, RED.filled())))?;

    root.present()?;
    Ok(())
}

fn date_bounds(first: NaiveDate, last: NaiveDate) -> (NaiveDate, NaiveDate) {
    if last > first {
        (first, last)
    } else {
        (first - Duration::days(1), first + Duration::days(1))
    }
}

/// Y range for a log axis: positive min/max with some headroom on both ends.
fn log_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite() && *v > 0.0) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() {
        return None;
    }
    Some((lo / 1.25, hi * 1.25))
}
