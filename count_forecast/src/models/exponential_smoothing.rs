//! Holt-Winters triple exponential smoothing with additive trend and season
//!
//! Recursions, for seasonal period `m`:
//! - level:    `l_t = alpha (y_t - s_{t-m}) + (1 - alpha)(l_{t-1} + b_{t-1})`
//! - trend:    `b_t = beta (l_t - l_{t-1}) + (1 - beta) b_{t-1}`
//! - seasonal: `s_t = gamma (y_t - l_t) + (1 - gamma) s_{t-m}`
//! - forecast: `y_{n+h} = l_n + h b_n + s_{n+h-m}`

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::{normal_quantile, ForecastModel, ForecastResult, TrainedForecastModel};
use serde::{Deserialize, Serialize};
use series_math::optimize::{from_unit_interval, minimize, to_unit_interval, NelderMeadOptions};
use series_math::stats::variance;

/// Smoothing weights, each strictly inside `(0, 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingWeights {
    /// Level weight
    pub alpha: f64,
    /// Trend weight
    pub beta: f64,
    /// Seasonal weight
    pub gamma: f64,
}

impl SmoothingWeights {
    /// Create weights, rejecting values outside `(0, 1)`
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        for (label, w) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !(w > 0.0 && w < 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be between 0 and 1, got {}",
                    label, w
                )));
            }
        }
        Ok(Self { alpha, beta, gamma })
    }

    fn from_unconstrained(params: &[f64]) -> Self {
        Self {
            alpha: to_unit_interval(params[0]),
            beta: to_unit_interval(params[1]),
            gamma: to_unit_interval(params[2]),
        }
    }
}

/// Components after running the recursions over a series
#[derive(Debug, Clone)]
struct SmoothedState {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    sse: f64,
    scored: usize,
}

/// Additive Holt-Winters model
#[derive(Debug, Clone)]
pub struct HoltWinters {
    /// Name of the model
    name: String,
    /// Seasonal period
    seasonal_period: usize,
    /// Fixed weights; estimated from the data when absent
    weights: Option<SmoothingWeights>,
    /// Optimizer settings for weight estimation
    optimizer: NelderMeadOptions,
}

/// Fitted Holt-Winters model
#[derive(Debug, Clone)]
pub struct TrainedHoltWinters {
    /// Name of the model
    name: String,
    /// Smoothing weights used
    weights: SmoothingWeights,
    /// Seasonal period
    seasonal_period: usize,
    /// Final level
    level: f64,
    /// Final trend
    trend: f64,
    /// Seasonal components indexed by `t mod period`
    seasonals: Vec<f64>,
    /// Training length
    n: usize,
    /// Mean squared one-step error over the scored part of the training window
    residual_variance: f64,
}

impl HoltWinters {
    /// Create a model whose weights are estimated when fitting
    pub fn new(seasonal_period: usize) -> Result<Self> {
        if seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                seasonal_period
            )));
        }

        Ok(Self {
            name: "Holt-Winters".to_string(),
            seasonal_period,
            weights: None,
            optimizer: NelderMeadOptions::default(),
        })
    }

    /// Use fixed smoothing weights instead of estimating them
    pub fn with_weights(mut self, weights: SmoothingWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Seasonal period
    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Minimum training length: two full seasonal cycles
    pub fn min_observations(&self) -> usize {
        2 * self.seasonal_period
    }

    /// Initial level, trend and seasonal components from the first two cycles
    fn initial_state(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
        let first = &values[..period];
        let second = &values[period..2 * period];

        let level = first.iter().sum::<f64>() / period as f64;
        let trend = first
            .iter()
            .zip(second)
            .map(|(a, b)| (b - a) / period as f64)
            .sum::<f64>()
            / period as f64;

        let mut seasonals: Vec<f64> = first.iter().map(|y| y - level).collect();
        let offset = seasonals.iter().sum::<f64>() / period as f64;
        seasonals.iter_mut().for_each(|s| *s -= offset);

        (level, trend, seasonals)
    }

    /// Run the recursions, accumulating one-step errors after the first cycle
    fn smooth(values: &[f64], weights: SmoothingWeights, period: usize) -> SmoothedState {
        let SmoothingWeights { alpha, beta, gamma } = weights;
        let (mut level, mut trend, mut seasonals) = Self::initial_state(values, period);
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate().skip(period) {
            let idx = t % period;
            let s = seasonals[idx];

            let error = y - (level + trend + s);
            sse += error * error;

            let previous = level;
            level = alpha * (y - s) + (1.0 - alpha) * (previous + trend);
            trend = beta * (level - previous) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
        }

        SmoothedState {
            level,
            trend,
            seasonals,
            sse,
            scored: values.len() - period,
        }
    }

    /// Estimate weights by minimizing in-sample squared one-step error
    fn estimate_weights(&self, values: &[f64]) -> Result<SmoothingWeights> {
        let period = self.seasonal_period;
        // Normalizing keeps the stopping tolerance meaningful at any count scale
        let scale = variance(values)
            .filter(|v| *v > 0.0)
            .unwrap_or(1.0)
            * values.len() as f64;

        let start = [
            from_unit_interval(0.3),
            from_unit_interval(0.1),
            from_unit_interval(0.1),
        ];

        let minimum = minimize(
            |params| {
                let weights = SmoothingWeights::from_unconstrained(params);
                Self::smooth(values, weights, period).sse / scale
            },
            &start,
            &self.optimizer,
        )
        .map_err(|e| ForecastError::ModelFitError(format!("{}: {}", self.name, e)))?;

        Ok(SmoothingWeights::from_unconstrained(&minimum.point))
    }
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self {
            name: "Holt-Winters".to_string(),
            seasonal_period: 12,
            weights: None,
            optimizer: NelderMeadOptions::default(),
        }
    }
}

impl ForecastModel for HoltWinters {
    type Trained = TrainedHoltWinters;

    fn fit(&self, data: &TimeSeries) -> Result<Self::Trained> {
        let values = data.values();
        let needed = self.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let weights = match self.weights {
            Some(w) => w,
            None => self.estimate_weights(&values)?,
        };

        let state = Self::smooth(&values, weights, self.seasonal_period);
        if !(state.level.is_finite() && state.trend.is_finite() && state.sse.is_finite()) {
            return Err(ForecastError::ModelFitError(format!(
                "{} recursions diverged",
                self.name
            )));
        }

        tracing::debug!(
            alpha = weights.alpha,
            beta = weights.beta,
            gamma = weights.gamma,
            sse = state.sse,
            "fitted holt-winters"
        );

        Ok(TrainedHoltWinters {
            name: self.name.clone(),
            weights,
            seasonal_period: self.seasonal_period,
            level: state.level,
            trend: state.trend,
            seasonals: state.seasonals,
            n: values.len(),
            residual_variance: state.sse / state.scored.max(1) as f64,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedHoltWinters {
    /// Smoothing weights used
    pub fn weights(&self) -> SmoothingWeights {
        self.weights
    }

    /// Final level
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Final trend
    pub fn trend(&self) -> f64 {
        self.trend
    }

    /// Seasonal components
    pub fn seasonals(&self) -> &[f64] {
        &self.seasonals
    }

    fn point_forecasts(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| {
                let s = self.seasonals[(self.n + h - 1) % self.seasonal_period];
                self.level + h as f64 * self.trend + s
            })
            .collect()
    }
}

impl TrainedForecastModel for TrainedHoltWinters {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }
        ForecastResult::new(self.point_forecasts(horizon), horizon)
    }

    fn forecast_with_intervals(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        let z = normal_quantile(level)?;
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }

        let values = self.point_forecasts(horizon);
        let intervals = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                // Uncertainty grows with each seasonal cycle ahead
                let cycles = i / self.seasonal_period + 1;
                let se = (self.residual_variance * cycles as f64).sqrt();
                (v - z * se, v + z * se)
            })
            .collect();

        ForecastResult::new_with_intervals(values, horizon, intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!(
            "Holt-Winters additive (alpha={:.3}, beta={:.3}, gamma={:.3}, m={})",
            self.weights.alpha, self.weights.beta, self.weights.gamma, self.seasonal_period
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seasonal_series(n: usize, period: usize) -> TimeSeries {
        TimeSeries::from_pairs(
            "synthetic",
            (0..n).map(|t| {
                let wave = [4.0, 1.0, -2.0, -3.0, 0.0, 2.0][t % 6] * (period as f64 / 6.0);
                (2000 + t as i32, 100.0 + 0.5 * t as f64 + wave)
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_requires_two_cycles() {
        let model = HoltWinters::new(6).unwrap();
        let result = model.fit(&seasonal_series(11, 6));
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { needed: 12, got: 11 })
        ));
    }

    #[test]
    fn test_rejects_degenerate_period() {
        assert!(HoltWinters::new(1).is_err());
    }

    #[test]
    fn test_tracks_clean_seasonal_trend() {
        let model = HoltWinters::new(6).unwrap();
        let series = seasonal_series(48, 6);
        let fitted = model.fit(&series).unwrap();
        let forecast = fitted.forecast(6).unwrap();

        for (h, value) in forecast.values().iter().enumerate() {
            let t = 48 + h;
            let expected = 100.0 + 0.5 * t as f64 + [4.0, 1.0, -2.0, -3.0, 0.0, 2.0][t % 6];
            assert_relative_eq!(*value, expected, epsilon = 1.0);
        }
    }

    #[test]
    fn test_fixed_weights_are_kept() {
        let weights = SmoothingWeights::new(0.5, 0.2, 0.3).unwrap();
        let model = HoltWinters::new(6).unwrap().with_weights(weights);
        let fitted = model.fit(&seasonal_series(24, 6)).unwrap();
        assert_eq!(fitted.weights(), weights);
        assert!(SmoothingWeights::new(0.0, 0.2, 0.3).is_err());
    }

    #[test]
    fn test_zero_steps_is_empty() {
        let fitted = HoltWinters::new(6)
            .unwrap()
            .fit(&seasonal_series(24, 6))
            .unwrap();
        assert!(fitted.forecast(0).unwrap().is_empty());
    }

    #[test]
    fn test_intervals_widen_by_cycle() {
        let fitted = HoltWinters::new(6)
            .unwrap()
            .with_weights(SmoothingWeights::new(0.4, 0.1, 0.2).unwrap())
            .fit(&seasonal_series(36, 6))
            .unwrap();
        let forecast = fitted.forecast_with_intervals(13, 0.9).unwrap();
        let widths: Vec<f64> = forecast
            .intervals()
            .unwrap()
            .iter()
            .map(|(lo, hi)| hi - lo)
            .collect();
        assert!(widths[0] <= widths[6]);
        assert!(widths[6] <= widths[12]);
        assert_relative_eq!(widths[0], widths[5]);
    }
}
