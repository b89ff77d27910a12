//! Descriptive statistics over plain slices

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance, `None` for an empty slice
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Sum of squared values
pub fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Lag-`k` autocovariance around the supplied mean, normalized by `n`
pub fn autocovariance(values: &[f64], mean: f64, lag: usize) -> f64 {
    let n = values.len();
    if lag >= n {
        return 0.0;
    }
    values
        .iter()
        .skip(lag)
        .zip(values.iter())
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum::<f64>()
        / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_variance() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&data).unwrap(), 5.0);
        assert_relative_eq!(variance(&data).unwrap(), 4.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(mean(&[]).is_none());
        assert!(variance(&[]).is_none());
    }

    #[test]
    fn test_sum_of_squares() {
        assert_eq!(sum_of_squares(&[1.0, -2.0, 3.0]), 14.0);
        assert_eq!(sum_of_squares(&[]), 0.0);
    }

    #[test]
    fn test_autocovariance_lag_zero_is_variance() {
        let data = [1.0, 3.0, 2.0, 5.0, 4.0];
        let m = mean(&data).unwrap();
        assert_relative_eq!(autocovariance(&data, m, 0), variance(&data).unwrap());
        assert_eq!(autocovariance(&data, m, 10), 0.0);
    }
}
