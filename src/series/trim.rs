//! Trailing-anomaly trimming.
//!
//! The most recent days of an upstream report are often incomplete: late
//! records arrive over the following days, so the last point can sit an order
//! of magnitude below the week before it. Such a drop is dropped rather than
//! plotted.

use tracing::debug;

use crate::domain::{DateSeries, TrimConfig};

/// Drop trailing points while they look like an incomplete report.
///
/// While the series is longer than `config.lookback` and the value
/// `config.lookback` points from the end exceeds the last value by more than
/// `config.max_drop_ratio`, the last point is removed. Returns the number of
/// removed points.
pub fn trim_abnormal_tail(series: &mut DateSeries, config: &TrimConfig) -> usize {
    let mut removed = 0;

    while series.len() > config.lookback {
        let (Some(reference), Some(last)) = (series.value_from_end(config.lookback), series.value_from_end(1))
        else {
            break;
        };

        // A non-positive last point cannot come out of the filter; treat it as an
        // unbounded drop instead of dividing by it.
        let abnormal = last <= 0.0 || reference / last > config.max_drop_ratio;
        if !abnormal {
            break;
        }

        if let Some((date, value)) = series.pop_last() {
            debug!(%date, value, reference, "dropping incomplete trailing point");
            removed += 1;
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series_of(values: &[f64]) -> DateSeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        DateSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Duration::days(i as i64), v)),
        )
    }

    #[test]
    fn drops_single_order_of_magnitude_drop() {
        let mut series = series_of(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 0.5]);
        let removed = trim_abnormal_tail(&mut series, &TrimConfig::default());
        assert_eq!(removed, 1);
        assert_eq!(series.len(), 8);
    }

    #[test]
    fn keeps_series_without_drop() {
        let values = [10.0, 12.0, 11.0, 9.0, 10.0, 13.0, 12.0, 11.0, 10.0, 2.0];
        let mut series = series_of(&values);
        let removed = trim_abnormal_tail(&mut series, &TrimConfig::default());
        assert_eq!(removed, 0);
        assert_eq!(series.values(), values.to_vec());
    }

    #[test]
    fn drops_several_trailing_points() {
        let mut values = vec![100.0; 12];
        values.extend([5.0, 1.0, 2.0]);
        let mut series = series_of(&values);
        let removed = trim_abnormal_tail(&mut series, &TrimConfig::default());
        assert_eq!(removed, 3);
        assert_eq!(series.len(), 12);
    }

    #[test]
    fn short_series_is_left_alone() {
        let mut series = series_of(&[100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 1.0]);
        let removed = trim_abnormal_tail(&mut series, &TrimConfig::default());
        assert_eq!(removed, 0);
        assert_eq!(series.len(), 8);
    }

    #[test]
    fn ratio_equal_to_threshold_is_kept() {
        let mut series = series_of(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 1.0]);
        let removed = trim_abnormal_tail(&mut series, &TrimConfig::default());
        assert_eq!(removed, 0);
    }

    #[test]
    fn honours_custom_lookback_and_ratio() {
        let config = TrimConfig::new(2, 3.0).unwrap();
        let mut series = series_of(&[9.0, 9.0, 9.0, 2.0]);
        let removed = trim_abnormal_tail(&mut series, &config);
        assert_eq!(removed, 1);
        assert_eq!(series.values(), vec![9.0, 9.0, 9.0]);
    }
}
