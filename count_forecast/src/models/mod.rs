//! Forecasting models for yearly count series
//!
//! Two model families are supported, Holt-Winters triple exponential
//! smoothing and seasonal ARIMA with automatic order search. Each family
//! implements [`ForecastModel`]; the closed set the pipeline works with is
//! [`ModelVariant`], whose fitted counterpart is [`FittedModel`].

use crate::config::PipelineConfig;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::Debug;

pub mod arima;
pub mod auto_arima;
pub mod exponential_smoothing;

use auto_arima::{AutoArima, TrainedAutoArima};
use exponential_smoothing::{HoltWinters, TrainedHoltWinters};

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Prediction intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ForecastingError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        if let Some(step) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::ForecastingError(format!(
                "Forecast is not finite at step {} of {}",
                step + 1,
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
        })
    }

    /// Create a new forecast result with prediction intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ForecastingError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let mut result = Self::new(values, horizons)?;
        result.intervals = Some(intervals);
        Ok(result)
    }

    /// Empty forecast
    pub fn empty() -> Self {
        Self {
            values: Vec::new(),
            horizons: 0,
            intervals: None,
        }
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Whether nothing was forecast
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the prediction intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// The first `steps` periods of this forecast
    pub fn prefix(&self, steps: usize) -> Result<ForecastResult> {
        if steps > self.horizons {
            return Err(ForecastError::ForecastingError(format!(
                "Cannot take {} steps from a {}-step forecast",
                steps, self.horizons
            )));
        }

        Ok(Self {
            values: self.values[..steps].to_vec(),
            horizons: steps,
            intervals: self.intervals.as_ref().map(|i| i[..steps].to_vec()),
        })
    }
}

/// Two-sided standard normal quantile for a central interval `level`
pub(crate) fn normal_quantile(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Interval level must be between 0 and 1, got {}",
            level
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
    Ok(normal.inverse_cdf((1.0 + level) / 2.0))
}

/// Fitted forecast model
pub trait TrainedForecastModel: Debug + Send {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// Generate forecast with central prediction intervals at `level`
    fn forecast_with_intervals(&self, horizons: usize, level: f64) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;

    /// Short description of the fitted form
    fn describe(&self) -> String;
}

/// Forecast model that can be fitted on a yearly series
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Trained: TrainedForecastModel;

    /// Fit the model on the training series
    fn fit(&self, data: &TimeSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// The model families the pipeline compares
#[derive(Debug, Clone)]
pub enum ModelVariant {
    /// Additive Holt-Winters
    ExponentialSmoothing(HoltWinters),
    /// Seasonal ARIMA with automatic order search
    AutoArima(AutoArima),
}

impl ModelVariant {
    /// Registered variants in tie-break order: Holt-Winters first, then ARIMA
    pub fn registry(config: &PipelineConfig) -> Result<Vec<ModelVariant>> {
        Ok(vec![
            ModelVariant::ExponentialSmoothing(HoltWinters::new(config.seasonal_period)?),
            ModelVariant::AutoArima(AutoArima::new(
                config.seasonal_period,
                config.seasonal_differencing,
                config.arima.clone(),
            )?),
        ])
    }

    /// Name of the model family
    pub fn name(&self) -> &str {
        match self {
            ModelVariant::ExponentialSmoothing(m) => m.name(),
            ModelVariant::AutoArima(m) => m.name(),
        }
    }

    /// Fit the variant on `series`
    pub fn fit(&self, series: &TimeSeries) -> Result<FittedModel> {
        match self {
            ModelVariant::ExponentialSmoothing(m) => {
                m.fit(series).map(FittedModel::ExponentialSmoothing)
            }
            ModelVariant::AutoArima(m) => m.fit(series).map(FittedModel::AutoArima),
        }
    }
}

/// Fitted state of one [`ModelVariant`]
#[derive(Debug, Clone)]
pub enum FittedModel {
    /// Fitted Holt-Winters
    ExponentialSmoothing(TrainedHoltWinters),
    /// Fitted seasonal ARIMA
    AutoArima(TrainedAutoArima),
}

impl FittedModel {
    fn inner(&self) -> &dyn TrainedForecastModel {
        match self {
            FittedModel::ExponentialSmoothing(m) => m,
            FittedModel::AutoArima(m) => m,
        }
    }

    /// Forecast `steps` periods after the training window
    pub fn forecast(&self, steps: usize) -> Result<ForecastResult> {
        self.inner().forecast(steps)
    }

    /// Forecast with prediction intervals
    pub fn forecast_with_intervals(&self, steps: usize, level: f64) -> Result<ForecastResult> {
        self.inner().forecast_with_intervals(steps, level)
    }

    /// Name of the model family
    pub fn name(&self) -> &str {
        self.inner().name()
    }

    /// Fitted form, e.g. `ARIMA(1,1,0)(0,1,1)[12]`
    pub fn describe(&self) -> String {
        self.inner().describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forecast_result_length_checked() {
        assert!(ForecastResult::new(vec![1.0, 2.0], 3).is_err());
        assert!(ForecastResult::new(vec![1.0, f64::NAN], 2).is_err());
    }

    #[test]
    fn test_prefix_keeps_intervals() {
        let result =
            ForecastResult::new_with_intervals(vec![1.0, 2.0, 3.0], 3, vec![(0.0, 2.0); 3])
                .unwrap();
        let head = result.prefix(2).unwrap();
        assert_eq!(head.values(), &[1.0, 2.0]);
        assert_eq!(head.intervals().unwrap().len(), 2);
        assert!(result.prefix(4).is_err());
    }

    #[test]
    fn test_normal_quantile() {
        assert_relative_eq!(normal_quantile(0.95).unwrap(), 1.959964, epsilon = 1e-5);
        assert!(normal_quantile(1.0).is_err());
    }

    #[test]
    fn test_registry_order() {
        let models = ModelVariant::registry(&PipelineConfig::default()).unwrap();
        let names: Vec<&str> = models.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Holt-Winters", "ARIMA"]);
    }
}
