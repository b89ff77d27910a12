//! End-to-end run: validate, select, project

use crate::config::PipelineConfig;
use crate::data::{GroundTruthTable, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::metrics::ModelScore;
use crate::models::ModelVariant;
use crate::projection::{Projection, ProjectionEngine};
use crate::selection::{ModelSelector, SelectionResult};
use crate::validation::{ModelFailure, ValidationEngine};

/// Everything one pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Entity the training series describes
    pub series_name: String,
    /// Last year of the training window
    pub last_training_year: i32,
    /// Years scored during validation
    pub validation_periods: Vec<i32>,
    /// Scores of the models that passed validation, in registration order
    pub scores: Vec<ModelScore>,
    /// Models excluded during validation
    pub failures: Vec<ModelFailure>,
    /// Winner and runner-up
    pub selection: SelectionResult,
    /// Future path of the winner
    pub projection: Projection,
}

/// Validation-based model selection and projection for one series
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: PipelineConfig,
    models: Vec<ModelVariant>,
}

impl ForecastPipeline {
    /// Pipeline over the default registry: Holt-Winters, then ARIMA
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let models = ModelVariant::registry(&config)?;
        Ok(Self { config, models })
    }

    /// Pipeline over an explicit registry; order decides ties
    pub fn with_models(config: PipelineConfig, models: Vec<ModelVariant>) -> Result<Self> {
        config.validate()?;
        if models.is_empty() {
            return Err(ForecastError::ConfigurationError(
                "At least one model must be registered".to_string(),
            ));
        }
        Ok(Self { config, models })
    }

    /// Settings in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registered models
    pub fn models(&self) -> &[ModelVariant] {
        &self.models
    }

    /// Validation years following the end of `training`
    pub fn validation_periods(&self, training: &TimeSeries) -> Result<Vec<i32>> {
        training.future_years(self.config.validation_years)
    }

    /// Run the pipeline on a training window ending right before the validation years
    pub fn run(
        &self,
        training: &TimeSeries,
        ground_truth: &GroundTruthTable,
    ) -> Result<PipelineOutcome> {
        let last_training_year = training.last_year().ok_or_else(|| {
            ForecastError::DataError("Training series is empty".to_string())
        })?;
        let periods = self.validation_periods(training)?;

        tracing::info!(
            series = training.name(),
            observations = training.len(),
            first = ?training.first_year(),
            last = last_training_year,
            validation = ?periods,
            "starting pipeline"
        );

        let report = ValidationEngine::new(self.models.clone(), self.config.future_horizon)
            .with_interval_level(self.config.interval_level)
            .with_fit_timeout(self.config.fit_timeout())
            .validate(training, ground_truth, &periods)?;

        let selection = ModelSelector::new().select(&report)?;
        let projection = ProjectionEngine::new(self.config.interval_level).project(
            &selection,
            last_training_year,
            self.config.future_horizon,
        )?;

        Ok(PipelineOutcome {
            series_name: training.name().to_string(),
            last_training_year,
            validation_periods: periods,
            scores: report.scores(),
            failures: report.failures,
            selection,
            projection,
        })
    }
}
