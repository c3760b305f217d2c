//! Centered moving average.
//!
//! The smoothed curve is plotted on the same x-axis as the raw data, so it must
//! have one value per input point. Only full windows are averaged; the edges are
//! padded with the nearest full-window average instead of shrinking the window,
//! which flattens the first and last few days of the trend.

use crate::domain::{DateSeries, SmoothedSeries};
use crate::error::InsufficientData;

/// Simple moving average over every full window of `window` values, padded to
/// the input length.
///
/// `(window - 1) / 2` copies of the first average are prepended and the rest of
/// the missing length is filled with copies of the last average.
pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<f64>, InsufficientData> {
    if window == 0 || values.len() < window {
        return Err(InsufficientData::new("smoothing", window.max(1), values.len()));
    }

    let n = window as f64;
    let means: Vec<f64> = values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / n)
        .collect();

    let head = (window - 1) / 2;
    let tail = values.len() - means.len() - head;

    let mut out = Vec::with_capacity(values.len());
    out.extend(std::iter::repeat_n(means[0], head));
    out.extend_from_slice(&means);
    out.extend(std::iter::repeat_n(means[means.len() - 1], tail));
    Ok(out)
}

/// Smooth a date series, keeping its dates.
pub fn smooth_series(series: &DateSeries, window: usize) -> Result<SmoothedSeries, InsufficientData> {
    let values = moving_average(&series.values(), window)?;
    Ok(SmoothedSeries {
        dates: series.dates(),
        values,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn output_length_matches_input() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let out = moving_average(&values, 7).unwrap();
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn centre_and_edges_use_full_windows() {
        let values = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0];
        let out = moving_average(&values, 7).unwrap();

        let first = values[0..7].iter().sum::<f64>() / 7.0;
        let last = values[3..10].iter().sum::<f64>() / 7.0;

        assert!(approx(out[3], first));
        for v in &out[0..3] {
            assert!(approx(*v, first));
        }
        for v in &out[7..10] {
            assert!(approx(*v, last));
        }
        assert!(approx(out[4], values[1..8].iter().sum::<f64>() / 7.0));
    }

    #[test]
    fn exactly_one_window_is_flat() {
        let values = [7.0, 0.0, 7.0, 0.0, 7.0, 0.0, 14.0];
        let out = moving_average(&values, 7).unwrap();
        assert_eq!(out.len(), 7);
        assert!(out.iter().all(|v| approx(*v, 5.0)));
    }

    #[test]
    fn even_window_still_preserves_length() {
        let values: Vec<f64> = (0..10).map(|v| v as f64).collect();
        let out = moving_average(&values, 4).unwrap();
        assert_eq!(out.len(), 10);
        assert!(approx(out[0], 1.5));
        assert!(approx(out[1], 1.5));
        assert!(approx(out[9], 7.5));
        assert!(approx(out[8], 7.5));
    }

    #[test]
    fn too_few_points_is_an_error() {
        let err = moving_average(&[1.0, 2.0, 3.0], 7).unwrap_err();
        assert_eq!(err, InsufficientData::new("smoothing", 7, 3));
        assert!(moving_average(&[1.0], 0).is_err());
    }

    #[test]
    fn smooth_series_keeps_dates() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let series = DateSeries::from_points((0..9).map(|i| (start + Duration::days(i), 1.0 + i as f64)));
        let smoothed = smooth_series(&series, 7).unwrap();
        assert_eq!(smoothed.dates, series.dates());
        assert_eq!(smoothed.window, 7);
        assert!(approx(smoothed.values[0], 4.0));
        assert!(approx(smoothed.values[8], 6.0));
    }
}
