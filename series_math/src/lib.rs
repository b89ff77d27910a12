//! # Series Math
//!
//! Numerical building blocks for forecasting yearly count series.
//! This crate provides the pieces the forecasting models are assembled from:
//! differencing and its inverse, lag polynomial algebra, stationarity
//! testing, information criteria and a bounded Nelder-Mead minimizer.
//! Classical additive decomposition is provided for exploratory analysis.

use thiserror::Error;

pub mod criteria;
pub mod decomposition;
pub mod differencing;
pub mod optimize;
pub mod polynomial;
pub mod stationarity;
pub mod stats;

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Optimization error: {0}")]
    OptimizationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;
