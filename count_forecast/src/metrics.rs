//! Metrics for evaluating forecast accuracy against ground truth

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// One scored validation year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRecord {
    /// Year scored
    pub period: i32,
    /// Forecast value
    pub predicted: f64,
    /// Ground-truth value
    pub actual: f64,
    /// `predicted - actual`
    pub difference: f64,
    /// `|predicted - actual|`
    pub absolute_difference: f64,
    /// `|predicted - actual| / |actual| * 100`
    pub percentage_error: f64,
}

/// Aggregate accuracy of one forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        writeln!(f, "  SMAPE: {:.4}%", self.smape)?;
        Ok(())
    }
}

/// Validation score of one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelScore {
    /// Registered name of the model
    pub model_name: String,
    /// Arithmetic mean of the record percentage errors
    pub mean_percentage_error: f64,
    /// Scored years in order
    pub records: Vec<ForecastRecord>,
    /// Supplementary aggregate metrics
    pub accuracy: ForecastAccuracy,
}

/// Percentage-error scoring of aligned forecasts
#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyScorer;

impl AccuracyScorer {
    /// Create a scorer
    pub fn new() -> Self {
        Self
    }

    /// Score `predicted` against `actual`, position by position.
    ///
    /// Fails on empty input, unequal lengths or any zero actual value.
    pub fn score_values(&self, predicted: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
        if predicted.is_empty() {
            return Err(ForecastError::ScoreError(
                "Cannot score an empty forecast".to_string(),
            ));
        }
        if predicted.len() != actual.len() {
            return Err(ForecastError::ScoreError(format!(
                "Forecast length ({}) doesn't match actual length ({})",
                predicted.len(),
                actual.len()
            )));
        }
        if let Some(i) = actual.iter().position(|a| *a == 0.0) {
            return Err(ForecastError::ScoreError(format!(
                "Percentage error is undefined for a zero actual value at position {}",
                i
            )));
        }

        let n = predicted.len() as f64;
        let errors: Vec<f64> = predicted.iter().zip(actual).map(|(p, a)| p - a).collect();

        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
        let mape = errors
            .iter()
            .zip(actual)
            .map(|(e, a)| e.abs() / a.abs() * 100.0)
            .sum::<f64>()
            / n;
        let smape = predicted
            .iter()
            .zip(actual)
            .map(|(p, a)| {
                let denom = p.abs() + a.abs();
                if denom == 0.0 {
                    0.0
                } else {
                    200.0 * (p - a).abs() / denom
                }
            })
            .sum::<f64>()
            / n;

        Ok(ForecastAccuracy {
            mae,
            rmse,
            mape,
            smape,
        })
    }

    /// Score a model's forecast for `periods` against `actual`
    pub fn score(
        &self,
        model_name: &str,
        periods: &[i32],
        predicted: &[f64],
        actual: &[f64],
    ) -> Result<ModelScore> {
        let accuracy = self.score_values(predicted, actual)?;
        if periods.len() != predicted.len() {
            return Err(ForecastError::ScoreError(format!(
                "{} periods supplied for {} forecast values",
                periods.len(),
                predicted.len()
            )));
        }

        let records: Vec<ForecastRecord> = periods
            .iter()
            .zip(predicted.iter().zip(actual))
            .map(|(&period, (&p, &a))| ForecastRecord {
                period,
                predicted: p,
                actual: a,
                difference: p - a,
                absolute_difference: (p - a).abs(),
                percentage_error: (p - a).abs() / a.abs() * 100.0,
            })
            .collect();

        let mean_percentage_error =
            records.iter().map(|r| r.percentage_error).sum::<f64>() / records.len() as f64;

        Ok(ModelScore {
            model_name: model_name.to_string(),
            mean_percentage_error,
            records,
            accuracy,
        })
    }
}
