//! Out-of-sample validation of the registered models
//!
//! Every model is fitted once on the training window and forecast once for
//! the longer of the validation span and the future horizon. The first
//! validation-length values are scored; the full forecast is kept for
//! projection.

use crate::data::{GroundTruthTable, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::metrics::{AccuracyScorer, ModelScore};
use crate::models::{FittedModel, ForecastResult, ModelVariant};
use serde::Serialize;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Stage at which a model dropped out of validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureStage {
    /// Fitting on the training window
    Fit,
    /// Producing the forecast
    Forecast,
    /// Scoring against ground truth
    Score,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Fit => write!(f, "fit"),
            FailureStage::Forecast => write!(f, "forecast"),
            FailureStage::Score => write!(f, "score"),
        }
    }
}

/// A model excluded from selection
#[derive(Debug, Clone, Serialize)]
pub struct ModelFailure {
    /// Registered name of the model
    pub model_name: String,
    /// Stage that failed
    pub stage: FailureStage,
    /// Error message
    pub error: String,
}

/// A model that passed validation
#[derive(Debug, Clone)]
pub struct ModelCandidate {
    /// Registered name of the model
    pub name: String,
    /// Position in the registry, used for tie-breaking
    pub registration: usize,
    /// Fitted state
    pub fitted: FittedModel,
    /// Forecast made during validation, at least as long as the horizon
    pub forecast: ForecastResult,
    /// Score over the validation years
    pub score: ModelScore,
}

/// Outcome of validating every registered model
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Years scored
    pub periods: Vec<i32>,
    /// Models that produced a score, in registration order
    pub candidates: Vec<ModelCandidate>,
    /// Models that were excluded
    pub failures: Vec<ModelFailure>,
}

impl ValidationReport {
    /// Scores of the surviving models, in registration order
    pub fn scores(&self) -> Vec<ModelScore> {
        self.candidates.iter().map(|c| c.score.clone()).collect()
    }
}

/// Fits, forecasts and scores every registered model
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    models: Vec<ModelVariant>,
    horizon: usize,
    interval_level: Option<f64>,
    fit_timeout: Option<Duration>,
    scorer: AccuracyScorer,
}

impl ValidationEngine {
    /// Create an engine that forecasts at least `horizon` steps per model
    pub fn new(models: Vec<ModelVariant>, horizon: usize) -> Self {
        Self {
            models,
            horizon,
            interval_level: None,
            fit_timeout: None,
            scorer: AccuracyScorer::new(),
        }
    }

    /// Attach prediction intervals at `level` to every forecast
    pub fn with_interval_level(mut self, level: Option<f64>) -> Self {
        self.interval_level = level;
        self
    }

    /// Give each fit a time budget.
    ///
    /// The fit runs on a worker thread. Once the budget expires the model is
    /// recorded as failed, but the worker cannot be interrupted: it keeps its
    /// CPU until the fit finishes and its result is dropped.
    pub fn with_fit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fit_timeout = timeout;
        self
    }

    /// Registered models
    pub fn models(&self) -> &[ModelVariant] {
        &self.models
    }

    /// Check the validation years before anything is fitted
    fn check_periods(periods: &[i32], ground_truth: &GroundTruthTable) -> Result<Vec<f64>> {
        if periods.is_empty() {
            return Err(ForecastError::ConfigurationError(
                "No validation years supplied".to_string(),
            ));
        }
        if let Some(pair) = periods.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ForecastError::ConfigurationError(format!(
                "Validation years must be strictly increasing, found {} after {}",
                pair[1], pair[0]
            )));
        }
        periods.iter().map(|&y| ground_truth.require(y)).collect()
    }

    fn fit(&self, model: &ModelVariant, training: &TimeSeries) -> Result<FittedModel> {
        let Some(timeout) = self.fit_timeout else {
            return model.fit(training);
        };

        let (tx, rx) = mpsc::channel();
        let worker_model = model.clone();
        let worker_series = training.clone();
        thread::spawn(move || {
            // The receiver is gone once the budget has expired
            let _ = tx.send(worker_model.fit(&worker_series));
        });

        rx.recv_timeout(timeout)
            .map_err(|_| ForecastError::Timeout(timeout))?
    }

    fn forecast(&self, fitted: &FittedModel, steps: usize) -> Result<ForecastResult> {
        match self.interval_level {
            Some(level) => fitted.forecast_with_intervals(steps, level),
            None => fitted.forecast(steps),
        }
    }

    /// Validate every model over `periods`.
    ///
    /// Missing ground truth is fatal; per-model failures are recorded and
    /// the remaining models carry on.
    pub fn validate(
        &self,
        training: &TimeSeries,
        ground_truth: &GroundTruthTable,
        periods: &[i32],
    ) -> Result<ValidationReport> {
        let actual = Self::check_periods(periods, ground_truth)?;
        let steps = periods.len().max(self.horizon);

        let mut candidates = Vec::new();
        let mut failures = Vec::new();

        for (registration, model) in self.models.iter().enumerate() {
            let name = model.name().to_string();
            let fail = |stage: FailureStage, error: ForecastError| {
                tracing::warn!(model = %name, %stage, %error, "model excluded from selection");
                ModelFailure {
                    model_name: name.clone(),
                    stage,
                    error: error.to_string(),
                }
            };

            let fitted = match self.fit(model, training) {
                Ok(f) => f,
                Err(e) => {
                    failures.push(fail(FailureStage::Fit, e));
                    continue;
                }
            };

            let forecast = match self.forecast(&fitted, steps) {
                Ok(f) => f,
                Err(e) => {
                    failures.push(fail(FailureStage::Forecast, e));
                    continue;
                }
            };

            let scored = forecast
                .prefix(periods.len())
                .and_then(|head| self.scorer.score(&name, periods, head.values(), &actual));
            let score = match scored {
                Ok(s) => s,
                Err(e) => {
                    failures.push(fail(FailureStage::Score, e));
                    continue;
                }
            };

            tracing::info!(
                model = %name,
                fitted = %fitted.describe(),
                mape = score.mean_percentage_error,
                "validated model"
            );

            candidates.push(ModelCandidate {
                name,
                registration,
                fitted,
                forecast,
                score,
            });
        }

        Ok(ValidationReport {
            periods: periods.to_vec(),
            candidates,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArimaSearchConfig, PipelineConfig};
    use crate::models::exponential_smoothing::HoltWinters;

    fn series() -> TimeSeries {
        TimeSeries::from_pairs(
            "x",
            (0..24).map(|t| (2000 + t, 100.0 + [3.0, -1.0, -2.0, 0.0][t as usize % 4])),
        )
        .unwrap()
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::new(
            vec![ModelVariant::ExponentialSmoothing(HoltWinters::new(4).unwrap())],
            4,
        )
    }

    #[test]
    fn test_missing_ground_truth_is_fatal() {
        let truth = GroundTruthTable::from_pairs(vec![(2024, 100.0)]).unwrap();
        let result = engine().validate(&series(), &truth, &[2024, 2025]);
        assert!(matches!(result, Err(ForecastError::ConfigurationError(_))));
    }

    #[test]
    fn test_unordered_periods_rejected() {
        let truth = GroundTruthTable::from_pairs(vec![(2024, 1.0), (2025, 1.0)]).unwrap();
        assert!(engine().validate(&series(), &truth, &[2025, 2024]).is_err());
        assert!(engine().validate(&series(), &truth, &[]).is_err());
    }

    #[test]
    fn test_zero_actual_recorded_as_failure() {
        let truth = GroundTruthTable::from_pairs(vec![(2024, 0.0), (2025, 100.0)]).unwrap();
        let report = engine().validate(&series(), &truth, &[2024, 2025]).unwrap();
        assert!(report.candidates.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, FailureStage::Score);
    }

    #[test]
    fn test_forecast_covers_horizon() {
        let truth = GroundTruthTable::from_pairs(vec![(2024, 103.0), (2025, 99.0)]).unwrap();
        let report = engine().validate(&series(), &truth, &[2024, 2025]).unwrap();
        let candidate = &report.candidates[0];
        assert_eq!(candidate.forecast.horizons(), 4);
        assert_eq!(candidate.score.records.len(), 2);
    }

    #[test]
    fn test_timed_out_fit_is_recorded() {
        let config = PipelineConfig {
            arima: ArimaSearchConfig {
                stepwise: false,
                ..ArimaSearchConfig::default()
            },
            ..PipelineConfig::default()
        };
        let training = TimeSeries::from_pairs(
            "x",
            (1950..=2020).map(|y| {
                let t = (y - 1950) as f64;
                (y, 20_000.0 + 150.0 * t + 800.0 * (t * std::f64::consts::PI / 6.0).sin())
            }),
        )
        .unwrap();
        let truth = GroundTruthTable::japan_reference();

        // Ample for Holt-Winters, far short of the exhaustive ARIMA grid
        let engine = ValidationEngine::new(ModelVariant::registry(&config).unwrap(), 10)
            .with_fit_timeout(Some(Duration::from_millis(50)));
        let report = engine
            .validate(&training, &truth, &[2021, 2022, 2023, 2024])
            .unwrap();

        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].name, "Holt-Winters");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].model_name, "ARIMA");
        assert_eq!(report.failures[0].stage, FailureStage::Fit);
        assert!(report.failures[0].error.contains("timed out"));
    }
}
