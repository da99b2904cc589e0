//! Descriptive statistics shared by every calculator
//!
//! All helpers are total: empty or degenerate input returns 0 rather than NaN
//! so that callers can feed partial biometric history without pre-checks.

use statrs::statistics::{Data, Median, Statistics};

/// Minutes in a day, used to unwrap times of day across midnight
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Times of day earlier than this (6 AM) belong to the previous evening
pub const DAY_ROLLOVER_MINUTES: f64 = 360.0;

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Median, 0 for an empty slice
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    Data::new(values.to_vec()).median()
}

/// Population standard deviation, 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Population variance, 0 for an empty slice
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().population_variance()
}

/// Coefficient of variation as a percentage (std-dev / mean * 100)
///
/// Returns 0 when the mean is not positive.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m <= 0.0 {
        return 0.0;
    }
    std_dev(values) / m * 100.0
}

/// Ordinary least-squares slope of `values` against their index
///
/// Returns 0 with fewer than two points or a degenerate denominator.
pub fn linear_regression_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n_f * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }

    (n_f * sum_xy - sum_x * sum_y) / denominator
}

/// Tukey IQR fence filter
///
/// Quartiles are taken at the plain integer indices `n/4` and `3n/4` of the
/// sorted values, without interpolation. Values inside
/// `[Q1 - k*IQR, Q3 + k*IQR]` are kept in their original order. Fewer than
/// four values are returned unchanged.
pub fn iqr_filter(values: &[f64], k: f64) -> Vec<f64> {
    let n = values.len();
    if n < 4 {
        return values.to_vec();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = sorted[n / 4];
    let q3 = sorted[3 * n / 4];
    let iqr = q3 - q1;
    let lower = q1 - k * iqr;
    let upper = q3 + k * iqr;

    values
        .iter()
        .copied()
        .filter(|v| *v >= lower && *v <= upper)
        .collect()
}

/// Shift early-morning times of day past midnight onto a continuous scale
///
/// 23:30 stays at 1410 while 00:30 becomes 1470, so a bedtime either side of
/// midnight is one hour apart rather than 23.
pub fn unwrap_time_of_day(minutes: f64) -> f64 {
    if minutes < DAY_ROLLOVER_MINUTES {
        minutes + MINUTES_PER_DAY
    } else {
        minutes
    }
}

/// Variance of times of day (minutes from midnight) on the unwrapped scale
pub fn time_of_day_variance(minutes: &[f64]) -> f64 {
    let unwrapped: Vec<f64> = minutes.iter().map(|m| unwrap_time_of_day(*m)).collect();
    variance(&unwrapped)
}

/// Standard deviation of times of day on the unwrapped scale
pub fn time_of_day_std_dev(minutes: &[f64]) -> f64 {
    time_of_day_variance(minutes).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
        assert_eq!(linear_regression_slope(&[]), 0.0);
        assert_eq!(linear_regression_slope(&[4.0]), 0.0);
    }

    #[test]
    fn test_mean_median_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-9);
        assert!((median(&values) - 4.5).abs() < 1e-9);
        assert!((std_dev(&values) - 2.0).abs() < 1e-9);
        assert!((variance(&values) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_coefficient_of_variation() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((coefficient_of_variation(&values) - 40.0).abs() < 1e-9);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_regression_slope() {
        assert!((linear_regression_slope(&[1.0, 2.0, 3.0, 4.0]) - 1.0).abs() < 1e-9);
        assert!((linear_regression_slope(&[10.0, 8.0, 6.0]) + 2.0).abs() < 1e-9);
        assert_eq!(linear_regression_slope(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_iqr_filter_removes_outlier() {
        let values = [50.0, 52.0, 49.0, 51.0, 50.0, 48.0, 120.0, 53.0];
        let filtered = iqr_filter(&values, 1.5);
        assert_eq!(filtered.len(), 7);
        assert!(!filtered.contains(&120.0));
        // Original order is preserved
        assert_eq!(filtered[0], 50.0);
        assert_eq!(filtered[6], 53.0);
    }

    #[test]
    fn test_iqr_filter_uniform_and_short() {
        let uniform = [42.0; 10];
        assert_eq!(iqr_filter(&uniform, 1.5), uniform.to_vec());

        let short = [1.0, 100.0, 1000.0];
        assert_eq!(iqr_filter(&short, 1.5), short.to_vec());
    }

    #[test]
    fn test_time_of_day_unwrapping() {
        assert_eq!(unwrap_time_of_day(1410.0), 1410.0);
        assert_eq!(unwrap_time_of_day(30.0), 1470.0);
        assert_eq!(unwrap_time_of_day(360.0), 360.0);

        // 23:30 and 00:30 are one hour apart: std-dev of 30 minutes
        let sd = time_of_day_std_dev(&[1410.0, 30.0]);
        assert!((sd - 30.0).abs() < 1e-9);
    }
}
