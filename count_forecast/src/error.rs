//! Error types for the count_forecast crate

use series_math::MathError;
use std::time::Duration;
use thiserror::Error;

/// Custom error types for the count_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Invalid series content or unusable input file
    #[error("Data error: {0}")]
    DataError(String),

    /// Training series too short for the configured seasonal period
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Parameter estimation or order search did not converge
    #[error("Model fit error: {0}")]
    ModelFitError(String),

    /// A fitted model could not produce the requested horizon
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Percentage error is undefined for the scored values
    #[error("Score error: {0}")]
    ScoreError(String),

    /// Every registered model failed validation
    #[error("No viable model: every registered model failed validation")]
    NoViableModel,

    /// Missing reference data or inconsistent pipeline settings
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A model fit exceeded its time budget
    #[error("Model fit timed out after {0:?}")]
    Timeout(Duration),

    /// Error from the numerical layer
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing or writing
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::JsonError(err.to_string())
    }
}

impl ForecastError {
    /// True for errors that end a pipeline run instead of excluding one model
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ForecastError::NoViableModel
                | ForecastError::ConfigurationError(_)
                | ForecastError::InvalidParameter(_)
        )
    }
}
