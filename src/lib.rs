//! # Suicide Forecast
//!
//! Yearly suicide-count forecasting with validated model selection.
//!
//! The workspace is split into two crates, re-exported here:
//!
//! - [`series_math`]: differencing, lag polynomials, the KPSS test,
//!   information criteria and a Nelder-Mead minimizer
//! - [`count_forecast`]: Holt-Winters and seasonal ARIMA models, validation
//!   against ground truth, model selection and projection
//!
//! ## Example
//!
//! ```no_run
//! use suicide_forecast::{ForecastPipeline, GroundTruthTable, PipelineConfig, TimeSeries};
//!
//! # fn main() -> Result<(), suicide_forecast::ForecastError> {
//! let training = TimeSeries::from_pairs("Japan", (1950..=2020).map(|y| (y, 20_000.0)))?;
//! let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let outcome = pipeline.run(&training, &GroundTruthTable::japan_reference())?;
//! println!("{}", outcome.selection.chosen_model_name());
//! # Ok(())
//! # }
//! ```

pub use count_forecast;
pub use series_math;

pub use count_forecast::{
    ForecastError, ForecastPipeline, GroundTruthTable, PipelineConfig, PipelineOutcome,
    PipelineReport, TimeSeries,
};
