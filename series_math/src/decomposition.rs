//! Classical additive decomposition
//!
//! `observed = trend + seasonal + residual`. The trend is a centred moving
//! average over one full period (a `2 x m` average for even `m`), so it is
//! undefined for the first and last half period. Those positions are `None`
//! in both trend and residual.

use crate::{MathError, Result};
use serde::Serialize;

/// Components of an additive decomposition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    /// Seasonal period
    pub period: usize,
    /// Input values
    pub observed: Vec<f64>,
    /// Centred moving average, `None` within half a period of either end
    pub trend: Vec<Option<f64>>,
    /// Seasonal effect per position, centred to sum to zero over a period
    pub seasonal: Vec<f64>,
    /// What trend and season leave unexplained
    pub residual: Vec<Option<f64>>,
}

impl Decomposition {
    /// One period of seasonal effects, starting at the first observation
    pub fn seasonal_cycle(&self) -> &[f64] {
        &self.seasonal[..self.period.min(self.seasonal.len())]
    }

    /// Index range where the trend is defined
    pub fn defined_range(&self) -> std::ops::Range<usize> {
        let start = self.trend.iter().position(Option::is_some).unwrap_or(0);
        let end = self
            .trend
            .iter()
            .rposition(Option::is_some)
            .map_or(start, |i| i + 1);
        start..end
    }
}

/// Moving-average weights centred on the middle element
fn trend_filter(period: usize) -> Vec<f64> {
    let m = period as f64;
    if period % 2 == 0 {
        let mut weights = vec![1.0 / m; period + 1];
        weights[0] = 0.5 / m;
        weights[period] = 0.5 / m;
        weights
    } else {
        vec![1.0 / m; period]
    }
}

/// Split `values` into trend, seasonal and residual parts.
///
/// At least two full periods are required.
pub fn decompose_additive(values: &[f64], period: usize) -> Result<Decomposition> {
    if period < 2 {
        return Err(MathError::InvalidInput(format!(
            "Seasonal period must be at least 2, got {}",
            period
        )));
    }
    if values.len() < 2 * period {
        return Err(MathError::InsufficientData(format!(
            "need two full periods ({} values), have {}",
            2 * period,
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Series contains non-finite values".to_string(),
        ));
    }

    let n = values.len();
    let weights = trend_filter(period);
    let half = weights.len() / 2;

    let trend: Vec<Option<f64>> = (0..n)
        .map(|t| {
            (t >= half && t + half < n).then(|| {
                weights
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * values[t + k - half])
                    .sum::<f64>()
            })
        })
        .collect();

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (t, tr) in trend.iter().enumerate() {
        if let Some(tr) = tr {
            sums[t % period] += values[t] - tr;
            counts[t % period] += 1;
        }
    }
    // Two full periods guarantee every position has a defined trend value
    let mut averages: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| s / c as f64)
        .collect();
    let level = averages.iter().sum::<f64>() / period as f64;
    for a in &mut averages {
        *a -= level;
    }

    let seasonal: Vec<f64> = (0..n).map(|t| averages[t % period]).collect();
    let residual = trend
        .iter()
        .enumerate()
        .map(|(t, tr)| tr.map(|tr| values[t] - tr - seasonal[t]))
        .collect();

    Ok(Decomposition {
        period,
        observed: values.to_vec(),
        trend,
        seasonal,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_trend_and_season_even_period() {
        let pattern = [3.0, -1.0, -2.0, 0.0];
        let values: Vec<f64> = (0..20)
            .map(|t| 10.0 + 0.5 * t as f64 + pattern[t % 4])
            .collect();
        let d = decompose_additive(&values, 4).unwrap();

        assert_eq!(d.defined_range(), 2..18);
        assert!(d.trend[..2].iter().all(Option::is_none));
        assert!(d.residual[18..].iter().all(Option::is_none));
        for t in d.defined_range() {
            assert_relative_eq!(d.trend[t].unwrap(), 10.0 + 0.5 * t as f64, epsilon = 1e-9);
            assert_relative_eq!(d.residual[t].unwrap(), 0.0, epsilon = 1e-9);
        }
        for (got, want) in d.seasonal_cycle().iter().zip(pattern) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_odd_period_window() {
        let values: Vec<f64> = (0..9).map(|t| [1.0, 2.0, 6.0][t % 3]).collect();
        let d = decompose_additive(&values, 3).unwrap();
        assert_eq!(d.defined_range(), 1..8);
        assert_relative_eq!(d.trend[1].unwrap(), 3.0);
        assert_relative_eq!(d.seasonal_cycle().iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(d.seasonal[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_needs_two_periods() {
        assert!(matches!(
            decompose_additive(&[1.0; 23], 12),
            Err(MathError::InsufficientData(_))
        ));
        assert!(decompose_additive(&[1.0; 10], 1).is_err());
        assert!(decompose_additive(&[1.0, f64::NAN, 1.0, 1.0], 2).is_err());
    }
}
