//! Choice of the model with the lowest validation error

use crate::error::{ForecastError, Result};
use crate::metrics::ModelScore;
use crate::models::FittedModel;
use crate::validation::{ModelCandidate, ValidationReport};

/// The winning model and the runner-up, if any
#[derive(Debug, Clone)]
pub struct SelectionResult {
    /// Winning candidate, including its validation forecast
    pub chosen: ModelCandidate,
    /// Scores of every other surviving candidate, in registration order
    pub rejected: Vec<ModelScore>,
}

impl SelectionResult {
    /// Name of the winning model
    pub fn chosen_model_name(&self) -> &str {
        &self.chosen.name
    }

    /// Fitted state of the winning model
    pub fn chosen_fitted_model(&self) -> &FittedModel {
        &self.chosen.fitted
    }

    /// Validation score of the winning model
    pub fn chosen_score(&self) -> &ModelScore {
        &self.chosen.score
    }

    /// Name of the best losing model
    pub fn rejected_model_name(&self) -> Option<&str> {
        self.best_rejected().map(|s| s.model_name.as_str())
    }

    /// Mean percentage error of the best losing model
    pub fn rejected_score(&self) -> Option<f64> {
        self.best_rejected().map(|s| s.mean_percentage_error)
    }

    fn best_rejected(&self) -> Option<&ModelScore> {
        ModelSelector::choose(&self.rejected)
            .ok()
            .map(|i| &self.rejected[i])
    }
}

/// Picks the minimum mean percentage error; earlier registration wins ties
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelSelector;

impl ModelSelector {
    /// Create a selector
    pub fn new() -> Self {
        Self
    }

    /// Index of the lowest score, the first one on ties
    pub fn choose(scores: &[ModelScore]) -> Result<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, score) in scores.iter().enumerate() {
            let mape = score.mean_percentage_error;
            if best.map_or(true, |(_, b)| mape < b) {
                best = Some((i, mape));
            }
        }
        best.map(|(i, _)| i).ok_or(ForecastError::NoViableModel)
    }

    /// Select from a validation report
    pub fn select(&self, report: &ValidationReport) -> Result<SelectionResult> {
        let index = Self::choose(&report.scores())?;
        let chosen = report.candidates[index].clone();
        let rejected = report
            .candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, c)| c.score.clone())
            .collect();

        tracing::info!(
            model = %chosen.name,
            mape = chosen.score.mean_percentage_error,
            "selected model"
        );

        Ok(SelectionResult { chosen, rejected })
    }
}
