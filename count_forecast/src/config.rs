//! Pipeline configuration
//!
//! Defaults reproduce the reference study: a 12-year seasonal period with one
//! seasonal difference, four validation years and a ten-year horizon counted
//! from the end of the training window.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use series_math::criteria::InformationCriterion;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Bounds and strategy for the ARIMA order search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArimaSearchConfig {
    /// Maximum non-seasonal AR order
    pub max_p: usize,
    /// Maximum non-seasonal MA order
    pub max_q: usize,
    /// Maximum non-seasonal differencing order
    pub max_d: usize,
    /// Maximum seasonal AR order
    pub max_seasonal_p: usize,
    /// Maximum seasonal MA order
    pub max_seasonal_q: usize,
    /// Maximum of `p + q + P + Q`
    pub max_order: usize,
    /// Stepwise neighbourhood search instead of the full grid
    pub stepwise: bool,
    /// Criterion minimized by the search
    pub criterion: InformationCriterion,
    /// Evaluate candidate orders on the rayon pool
    pub parallel_candidates: bool,
}

impl Default for ArimaSearchConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_d: 2,
            max_seasonal_p: 2,
            max_seasonal_q: 2,
            max_order: 5,
            stepwise: true,
            criterion: InformationCriterion::Aicc,
            parallel_candidates: false,
        }
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seasonal period shared by both models
    pub seasonal_period: usize,
    /// Seasonal differencing order of the ARIMA model (not searched)
    pub seasonal_differencing: usize,
    /// Number of years after the training window scored against ground truth
    pub validation_years: usize,
    /// Projection length counted from the end of the training window
    pub future_horizon: usize,
    /// Central prediction interval level, `None` for point forecasts only
    pub interval_level: Option<f64>,
    /// ARIMA search settings
    pub arima: ArimaSearchConfig,
    /// Per-model fit budget in milliseconds
    pub fit_timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seasonal_period: 12,
            seasonal_differencing: 1,
            validation_years: 4,
            future_horizon: 10,
            interval_level: Some(0.95),
            arima: ArimaSearchConfig::default(),
            fit_timeout_ms: None,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: PipelineConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable together
    pub fn validate(&self) -> Result<()> {
        if self.seasonal_period < 2 {
            return Err(ForecastError::ConfigurationError(format!(
                "Seasonal period must be at least 2, got {}",
                self.seasonal_period
            )));
        }
        if self.validation_years == 0 {
            return Err(ForecastError::ConfigurationError(
                "Validation span must cover at least one year".to_string(),
            ));
        }
        if self.future_horizon < self.validation_years {
            return Err(ForecastError::ConfigurationError(format!(
                "Future horizon ({}) must cover the validation span ({})",
                self.future_horizon, self.validation_years
            )));
        }
        if let Some(level) = self.interval_level {
            if !(level > 0.0 && level < 1.0) {
                return Err(ForecastError::ConfigurationError(format!(
                    "Interval level must be between 0 and 1, got {}",
                    level
                )));
            }
        }
        if self.fit_timeout_ms == Some(0) {
            return Err(ForecastError::ConfigurationError(
                "Fit timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Fit budget as a duration
    pub fn fit_timeout(&self) -> Option<Duration> {
        self.fit_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_reference_setup() {
        let config = PipelineConfig::default();
        assert_eq!(config.seasonal_period, 12);
        assert_eq!(config.seasonal_differencing, 1);
        assert_eq!(config.validation_years, 4);
        assert_eq!(config.future_horizon, 10);
        assert_eq!(config.arima.max_p, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_horizon_must_cover_validation() {
        let config = PipelineConfig {
            future_horizon: 2,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ForecastError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"future_horizon": 12, "arima": {{"stepwise": false, "criterion": "bic"}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.future_horizon, 12);
        assert_eq!(config.seasonal_period, 12);
        assert!(!config.arima.stepwise);
        assert_eq!(config.arima.criterion, InformationCriterion::Bic);
        assert_eq!(config.arima.max_q, 5);
    }

    #[test]
    fn test_fit_timeout_in_milliseconds() {
        let config = PipelineConfig {
            fit_timeout_ms: Some(250),
            ..PipelineConfig::default()
        };
        assert_eq!(config.fit_timeout(), Some(Duration::from_millis(250)));

        let zero = PipelineConfig {
            fit_timeout_ms: Some(0),
            ..PipelineConfig::default()
        };
        assert!(zero.validate().is_err());
    }
}
