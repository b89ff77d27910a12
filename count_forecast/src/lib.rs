//! # Count Forecast
//!
//! Forecasting of yearly count series with validation-based model selection.
//!
//! ## Features
//!
//! - Yearly series handling and ingestion of the combined per-country dataset
//! - Holt-Winters triple exponential smoothing (additive trend and season)
//! - Seasonal ARIMA with KPSS-based differencing and stepwise order search
//! - Out-of-sample validation by mean absolute percentage error
//! - Deterministic model selection; the first registered model wins ties
//! - Projection from the already-fitted winner, optionally with prediction intervals
//! - Additive decomposition and a global yearly summary for exploration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use count_forecast::config::PipelineConfig;
//! use count_forecast::data::{CountryDataset, GroundTruthTable};
//! use count_forecast::pipeline::ForecastPipeline;
//! use count_forecast::report::PipelineReport;
//!
//! # fn main() -> count_forecast::error::Result<()> {
//! let dataset = CountryDataset::from_csv("data/combined_processed_data.csv")?;
//! let (training, _) = dataset.series_for("Japan")?.split_at_year(2020);
//!
//! let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let outcome = pipeline.run(&training, &GroundTruthTable::japan_reference())?;
//!
//! println!("{}", PipelineReport::from_outcome(&outcome).render_text());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod projection;
pub mod report;
pub mod selection;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use crate::analysis::{GlobalSummary, SeriesDecomposition};
pub use crate::config::{ArimaSearchConfig, PipelineConfig};
pub use crate::data::{CountryDataset, GroundTruthTable, SeriesProvider, TimeSeries};
pub use crate::error::ForecastError;
pub use crate::models::{FittedModel, ForecastModel, ForecastResult, ModelVariant};
pub use crate::pipeline::{ForecastPipeline, PipelineOutcome};
pub use crate::report::PipelineReport;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
