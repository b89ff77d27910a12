//! Future projection from the selected, already-fitted model

use crate::error::{ForecastError, Result};
use crate::selection::SelectionResult;
use serde::Serialize;

/// Values within this relative distance count as the same forecast
const PREFIX_TOLERANCE: f64 = 1e-9;

/// One projected year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    /// Calendar year
    pub year: i32,
    /// Point forecast
    pub value: f64,
    /// Lower prediction bound, when intervals were requested
    pub lower: Option<f64>,
    /// Upper prediction bound, when intervals were requested
    pub upper: Option<f64>,
}

/// Forecast path of the selected model after the training window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Model that produced the values
    pub model_name: String,
    /// Years after the training window, in order
    pub points: Vec<ProjectedPoint>,
    /// Leading points that were scored during validation
    pub validation_len: usize,
}

impl Projection {
    /// Point forecasts in year order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Years in order
    pub fn years(&self) -> Vec<i32> {
        self.points.iter().map(|p| p.year).collect()
    }

    /// Points beyond the validation years
    pub fn future(&self) -> &[ProjectedPoint] {
        &self.points[self.validation_len.min(self.points.len())..]
    }
}

/// Slices the validation forecast of the selected model into a projection
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEngine {
    /// Interval level used if the model has to forecast again
    interval_level: Option<f64>,
}

impl ProjectionEngine {
    /// Create an engine; `interval_level` should match the validation run
    pub fn new(interval_level: Option<f64>) -> Self {
        Self { interval_level }
    }

    /// Project `horizon_steps` years starting right after `last_training_year`.
    ///
    /// Steps already forecast during validation are reused as they are.
    /// Longer horizons ask the fitted model again and require the new
    /// forecast to agree with the validated prefix.
    pub fn project(
        &self,
        selection: &SelectionResult,
        last_training_year: i32,
        horizon_steps: usize,
    ) -> Result<Projection> {
        let chosen = &selection.chosen;
        let stored = &chosen.forecast;
        let validation_len = chosen.score.records.len();

        let forecast = if horizon_steps <= stored.horizons() {
            stored.prefix(horizon_steps)?
        } else {
            tracing::debug!(
                stored = stored.horizons(),
                requested = horizon_steps,
                "extending validation forecast"
            );
            let longer = match self.interval_level {
                Some(level) => chosen.fitted.forecast_with_intervals(horizon_steps, level)?,
                None => chosen.fitted.forecast(horizon_steps)?,
            };
            check_prefix(stored.values(), longer.values())?;
            longer
        };

        let intervals = forecast.intervals();
        let points = forecast
            .values()
            .iter()
            .enumerate()
            .map(|(i, &value)| ProjectedPoint {
                year: last_training_year + i as i32 + 1,
                value,
                lower: intervals.map(|iv| iv[i].0),
                upper: intervals.map(|iv| iv[i].1),
            })
            .collect();

        Ok(Projection {
            model_name: chosen.name.clone(),
            points,
            validation_len,
        })
    }
}

fn check_prefix(validated: &[f64], longer: &[f64]) -> Result<()> {
    for (step, (a, b)) in validated.iter().zip(longer).enumerate() {
        if (a - b).abs() > PREFIX_TOLERANCE * a.abs().max(1.0) {
            return Err(ForecastError::ForecastingError(format!(
                "Extended forecast disagrees with the validated forecast at step {}: {} vs {}",
                step + 1,
                b,
                a
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GroundTruthTable, TimeSeries};
    use crate::models::exponential_smoothing::HoltWinters;
    use crate::models::ModelVariant;
    use crate::selection::ModelSelector;
    use crate::validation::ValidationEngine;

    fn selection(horizon: usize, level: Option<f64>) -> SelectionResult {
        let training = TimeSeries::from_pairs(
            "x",
            (0..24).map(|t| (1990 + t, 50.0 + t as f64 + [2.0, -2.0, 1.0, -1.0][t as usize % 4])),
        )
        .unwrap();
        let truth = GroundTruthTable::from_pairs(vec![(2014, 76.0), (2015, 73.0)]).unwrap();
        let report = ValidationEngine::new(
            vec![ModelVariant::ExponentialSmoothing(HoltWinters::new(4).unwrap())],
            horizon,
        )
        .with_interval_level(level)
        .validate(&training, &truth, &[2014, 2015])
        .unwrap();
        ModelSelector::new().select(&report).unwrap()
    }

    #[test]
    fn test_validation_length_returns_validation_forecast() {
        let selection = selection(2, None);
        let projection = ProjectionEngine::new(None).project(&selection, 2013, 2).unwrap();
        let validated: Vec<f64> = selection
            .chosen_score()
            .records
            .iter()
            .map(|r| r.predicted)
            .collect();
        assert_eq!(projection.values(), validated);
        assert!(projection.future().is_empty());
    }

    #[test]
    fn test_years_follow_training_window() {
        let projection = ProjectionEngine::new(None)
            .project(&selection(6, None), 2013, 6)
            .unwrap();
        assert_eq!(projection.years(), (2014..2020).collect::<Vec<_>>());
        assert_eq!(projection.future().len(), 4);
    }

    #[test]
    fn test_longer_horizon_extends_without_refit() {
        let selection = selection(2, Some(0.8));
        let short = ProjectionEngine::new(Some(0.8)).project(&selection, 2013, 2).unwrap();
        let long = ProjectionEngine::new(Some(0.8)).project(&selection, 2013, 5).unwrap();
        assert_eq!(long.points.len(), 5);
        assert_eq!(&long.values()[..2], short.values().as_slice());
        assert!(long.points.iter().all(|p| p.lower.is_some() && p.upper.is_some()));
    }
}
