//! Text and JSON rendering of a pipeline run

use crate::metrics::{ForecastRecord, ModelScore};
use crate::pipeline::PipelineOutcome;
use crate::projection::ProjectedPoint;
use crate::utils::{group_thousands, signed_thousands};
use crate::validation::ModelFailure;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

const RULE_WIDTH: usize = 60;

/// Serializable summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Entity forecast
    pub series: String,
    /// Last year of the training window
    pub last_training_year: i32,
    /// Validation years
    pub validation_periods: Vec<i32>,
    /// Validation score per surviving model
    pub scores: Vec<ModelScore>,
    /// Models excluded during validation
    pub failures: Vec<ModelFailure>,
    /// Name of the selected model
    pub chosen_model: String,
    /// Fitted form of the selected model
    pub chosen_description: String,
    /// Mean percentage error of the selected model
    pub chosen_mape: f64,
    /// Projection from the end of the training window
    pub projection: Vec<ProjectedPoint>,
}

impl PipelineReport {
    /// Summarize an outcome, stamped with the current time
    pub fn from_outcome(outcome: &PipelineOutcome) -> Self {
        Self::from_outcome_at(outcome, Utc::now())
    }

    /// Summarize an outcome with an explicit timestamp
    pub fn from_outcome_at(outcome: &PipelineOutcome, generated_at: DateTime<Utc>) -> Self {
        let selection = &outcome.selection;
        Self {
            generated_at,
            series: outcome.series_name.clone(),
            last_training_year: outcome.last_training_year,
            validation_periods: outcome.validation_periods.clone(),
            scores: outcome.scores.clone(),
            failures: outcome.failures.clone(),
            chosen_model: selection.chosen_model_name().to_string(),
            chosen_description: selection.chosen_fitted_model().describe(),
            chosen_mape: selection.chosen_score().mean_percentage_error,
            projection: outcome.projection.points.clone(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report: validation tables, winner and projection
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{}", heavy)?;
        writeln!(f, "FORECAST: {}", self.series)?;
        writeln!(f, "{}", heavy)?;
        writeln!(
            f,
            "Training window ends {}; validation years {}",
            self.last_training_year,
            span(&self.validation_periods)
        )?;

        for score in &self.scores {
            writeln!(f, "\n{}:", score.model_name)?;
            writeln!(
                f,
                "{:<6} {:>12} {:>12} {:>12} {:>10}",
                "Year", "Predicted", "Actual", "Difference", "Error %"
            )?;
            writeln!(f, "{}", light)?;
            for record in &score.records {
                writeln!(f, "{}", record_row(record))?;
            }
            writeln!(f, "{}", light)?;
            writeln!(
                f,
                "MAPE {}: {:.2}%",
                score.model_name, score.mean_percentage_error
            )?;
        }

        if !self.failures.is_empty() {
            writeln!(f, "\nExcluded models:")?;
            for failure in &self.failures {
                writeln!(
                    f,
                    "  {} ({} failed): {}",
                    failure.model_name, failure.stage, failure.error
                )?;
            }
        }

        writeln!(
            f,
            "\nBest model: {} (MAPE {:.2}%)",
            self.chosen_model, self.chosen_mape
        )?;
        writeln!(f, "  {}", self.chosen_description)?;

        let future: Vec<&ProjectedPoint> = self
            .projection
            .iter()
            .skip(self.validation_periods.len())
            .collect();
        if !future.is_empty() {
            let years: Vec<i32> = future.iter().map(|p| p.year).collect();
            writeln!(f, "\n{}", heavy)?;
            writeln!(f, "PROJECTION {}", span(&years))?;
            writeln!(f, "{}", heavy)?;
            for point in future {
                writeln!(f, "{}", projection_row(point))?;
            }
        }

        Ok(())
    }
}

fn span(years: &[i32]) -> String {
    match (years.first(), years.last()) {
        (Some(first), Some(last)) if first != last => format!("{}-{}", first, last),
        (Some(first), _) => first.to_string(),
        _ => "none".to_string(),
    }
}

fn record_row(record: &ForecastRecord) -> String {
    format!(
        "{:<6} {:>12} {:>12} {:>12} {:>9.2}%",
        record.period,
        group_thousands(record.predicted),
        group_thousands(record.actual),
        signed_thousands(record.difference),
        record.percentage_error
    )
}

fn projection_row(point: &ProjectedPoint) -> String {
    match (point.lower, point.upper) {
        (Some(lower), Some(upper)) => format!(
            "  {}: {} [{} - {}]",
            point.year,
            group_thousands(point.value),
            group_thousands(lower),
            group_thousands(upper)
        ),
        _ => format!("  {}: {}", point.year, group_thousands(point.value)),
    }
}
