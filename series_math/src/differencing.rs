//! Ordinary and seasonal differencing
//!
//! A [`Differencer`] remembers the tail of every series it differenced so
//! forecasts made on the differenced scale can be integrated back onto the
//! original scale.

use crate::{MathError, Result};

/// Lagged difference `x[t] - x[t - lag]`
pub fn difference(series: &[f64], lag: usize) -> Result<Vec<f64>> {
    if lag == 0 {
        return Err(MathError::InvalidInput(
            "Differencing lag must be greater than zero".to_string(),
        ));
    }
    if series.len() <= lag {
        return Err(MathError::InsufficientData(format!(
            "Cannot difference at lag {} with only {} values",
            lag,
            series.len()
        )));
    }

    Ok(series
        .iter()
        .skip(lag)
        .zip(series.iter())
        .map(|(curr, prev)| curr - prev)
        .collect())
}

/// One differencing pass and the values needed to undo it
#[derive(Debug, Clone, PartialEq)]
struct DiffStep {
    lag: usize,
    tail: Vec<f64>,
}

/// Applies seasonal then ordinary differencing and inverts it for forecasts
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Differencer {
    steps: Vec<DiffStep>,
}

impl Differencer {
    /// Difference `series` `seasonal_order` times at `period`, then `order` times at lag 1
    pub fn apply(
        series: &[f64],
        period: usize,
        seasonal_order: usize,
        order: usize,
    ) -> Result<(Self, Vec<f64>)> {
        let mut steps = Vec::with_capacity(seasonal_order + order);
        let mut current = series.to_vec();

        let lags = std::iter::repeat(period)
            .take(seasonal_order)
            .chain(std::iter::repeat(1).take(order));

        for lag in lags {
            let next = difference(&current, lag)?;
            steps.push(DiffStep {
                lag,
                tail: current[current.len() - lag..].to_vec(),
            });
            current = next;
        }

        Ok((Self { steps }, current))
    }

    /// Lags applied, in application order
    pub fn lags(&self) -> Vec<usize> {
        self.steps.iter().map(|s| s.lag).collect()
    }

    /// Map forecasts of the differenced series back to the original scale
    pub fn integrate(&self, forecasts: &[f64]) -> Vec<f64> {
        let mut result = forecasts.to_vec();

        for step in self.steps.iter().rev() {
            let mut extended = step.tail.clone();
            for &value in &result {
                let base = extended[extended.len() - step.lag];
                extended.push(value + base);
            }
            result = extended.split_off(step.tail.len());
        }

        result
    }
}
