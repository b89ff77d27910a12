//! Exploratory views of the data: per-country decomposition and the global
//! yearly total

use crate::data::{Observation, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::utils::group_thousands;
use serde::Serialize;
use series_math::decomposition::{decompose_additive, Decomposition};
use std::fmt;

/// Additive decomposition of a yearly series
#[derive(Debug, Clone, Serialize)]
pub struct SeriesDecomposition {
    /// Entity the series describes
    pub series: String,
    /// Year of each component entry
    pub years: Vec<i32>,
    /// Components, aligned with `years`
    pub components: Decomposition,
}

impl SeriesDecomposition {
    /// Decompose `series` with the given seasonal period
    pub fn new(series: &TimeSeries, period: usize) -> Result<Self> {
        let components = decompose_additive(&series.values(), period)?;
        tracing::debug!(
            series = series.name(),
            period,
            defined = components.defined_range().len(),
            "decomposed series"
        );
        Ok(Self {
            series: series.name().to_string(),
            years: series.years(),
            components,
        })
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), group_thousands)
}

impl fmt::Display for SeriesDecomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.components;
        writeln!(
            f,
            "Additive decomposition of {} (period {})",
            self.series, c.period
        )?;
        writeln!(
            f,
            "{:<6} {:>12} {:>12} {:>12} {:>12}",
            "Year", "Observed", "Trend", "Seasonal", "Residual"
        )?;
        for (i, year) in self.years.iter().enumerate() {
            writeln!(
                f,
                "{:<6} {:>12} {:>12} {:>12} {:>12}",
                year,
                group_thousands(c.observed[i]),
                optional(c.trend[i]),
                group_thousands(c.seasonal[i]),
                optional(c.residual[i])
            )?;
        }
        Ok(())
    }
}

/// Summary statistics of a yearly total
#[derive(Debug, Clone, Serialize)]
pub struct GlobalSummary {
    /// First year covered
    pub first_year: i32,
    /// Last year covered
    pub last_year: i32,
    /// Sum over every year
    pub total: f64,
    /// Mean per year
    pub annual_mean: f64,
    /// Year with the highest count; the earliest wins ties
    pub highest: Observation,
    /// Year with the lowest count; the earliest wins ties
    pub lowest: Observation,
}

impl GlobalSummary {
    /// Summarize a yearly series
    pub fn from_series(series: &TimeSeries) -> Result<Self> {
        let observations = series.observations();
        let (Some(first), Some(last)) = (observations.first(), observations.last()) else {
            return Err(ForecastError::DataError(format!(
                "Cannot summarize empty series '{}'",
                series.name()
            )));
        };

        let mut highest = *first;
        let mut lowest = *first;
        for o in &observations[1..] {
            if o.value > highest.value {
                highest = *o;
            }
            if o.value < lowest.value {
                lowest = *o;
            }
        }
        let total: f64 = observations.iter().map(|o| o.value).sum();

        Ok(Self {
            first_year: first.year,
            last_year: last.year,
            total,
            annual_mean: total / observations.len() as f64,
            highest,
            lowest,
        })
    }
}

impl fmt::Display for GlobalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Period: {} - {}", self.first_year, self.last_year)?;
        writeln!(f, "Total recorded: {}", group_thousands(self.total))?;
        writeln!(f, "Annual mean: {}", group_thousands(self.annual_mean))?;
        writeln!(
            f,
            "Highest year: {} ({})",
            self.highest.year,
            group_thousands(self.highest.value)
        )?;
        writeln!(
            f,
            "Lowest year: {} ({})",
            self.lowest.year,
            group_thousands(self.lowest.value)
        )
    }
}
