//! Yearly series, ground-truth tables and country data ingestion

use crate::error::{ForecastError, Result};
use crate::utils::consecutive_years;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// One yearly observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar year
    pub year: i32,
    /// Observed count
    pub value: f64,
}

/// Immutable yearly count series with strictly increasing years
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    /// Entity the series describes (e.g. a country)
    name: String,
    /// Observations in year order
    observations: Vec<Observation>,
}

impl TimeSeries {
    /// Create a series, checking year order and value validity
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Result<Self> {
        for pair in observations.windows(2) {
            if pair[1].year <= pair[0].year {
                return Err(ForecastError::DataError(format!(
                    "Years must be strictly increasing, found {} after {}",
                    pair[1].year, pair[0].year
                )));
            }
        }

        if let Some(bad) = observations
            .iter()
            .find(|o| !o.value.is_finite() || o.value < 0.0)
        {
            return Err(ForecastError::DataError(format!(
                "Value for {} must be a non-negative number, got {}",
                bad.year, bad.value
            )));
        }

        Ok(Self {
            name: name.into(),
            observations,
        })
    }

    /// Create a series from `(year, value)` pairs
    pub fn from_pairs<I>(name: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let observations = pairs
            .into_iter()
            .map(|(year, value)| Observation { year, value })
            .collect();
        Self::new(name, observations)
    }

    /// Name of the entity
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no observations
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations in year order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Years in order
    pub fn years(&self) -> Vec<i32> {
        self.observations.iter().map(|o| o.year).collect()
    }

    /// Values in year order
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// First year, if any
    pub fn first_year(&self) -> Option<i32> {
        self.observations.first().map(|o| o.year)
    }

    /// Last year, if any
    pub fn last_year(&self) -> Option<i32> {
        self.observations.last().map(|o| o.year)
    }

    /// Value recorded for `year`
    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.observations
            .binary_search_by_key(&year, |o| o.year)
            .ok()
            .map(|i| self.observations[i].value)
    }

    /// Split into the observations up to and including `year` and the rest
    pub fn split_at_year(&self, year: i32) -> (TimeSeries, TimeSeries) {
        let cut = self.observations.partition_point(|o| o.year <= year);
        let (head, tail) = self.observations.split_at(cut);
        (
            TimeSeries {
                name: self.name.clone(),
                observations: head.to_vec(),
            },
            TimeSeries {
                name: self.name.clone(),
                observations: tail.to_vec(),
            },
        )
    }

    /// The `steps` years following the last observation
    pub fn future_years(&self, steps: usize) -> Result<Vec<i32>> {
        let last = self.last_year().ok_or_else(|| {
            ForecastError::DataError("Cannot extend an empty series".to_string())
        })?;
        Ok(consecutive_years(last + 1, steps))
    }
}

/// Source of aggregated yearly series for one entity
pub trait SeriesProvider {
    /// Series for `entity`
    fn series(&self, entity: &str) -> Result<TimeSeries>;
}

/// Actual values for validation years, supplied as external reference data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruthTable {
    values: BTreeMap<i32, f64>,
}

impl GroundTruthTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(year, actual)` pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let mut table = Self::new();
        for (year, value) in pairs {
            table.insert(year, value)?;
        }
        Ok(table)
    }

    /// Curated suicide counts for Japan, 2021-2024
    pub fn japan_reference() -> Self {
        Self {
            values: BTreeMap::from([
                (2021, 20291.0),
                (2022, 21881.0),
                (2023, 21837.0),
                (2024, 20268.0),
            ]),
        }
    }

    /// Built-in table for `country`.
    ///
    /// Only Japan has curated figures; every other country needs an
    /// explicit table.
    pub fn reference_for(country: &str) -> Result<Self> {
        if country.eq_ignore_ascii_case("Japan") {
            Ok(Self::japan_reference())
        } else {
            Err(ForecastError::ConfigurationError(format!(
                "--ground-truth is required for {}",
                country
            )))
        }
    }

    /// Load a `{"2021": 20291, ...}` JSON table
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let table: GroundTruthTable = serde_json::from_reader(file)?;
        if let Some((year, value)) = table.values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Ground truth for {} is not a number: {}",
                year, value
            )));
        }
        Ok(table)
    }

    /// Add or replace the actual value for `year`
    pub fn insert(&mut self, year: i32, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(ForecastError::DataError(format!(
                "Ground truth for {} must be finite, got {}",
                year, value
            )));
        }
        self.values.insert(year, value);
        Ok(())
    }

    /// Actual value for `year`
    pub fn get(&self, year: i32) -> Option<f64> {
        self.values.get(&year).copied()
    }

    /// Actual value for `year`, or a configuration error naming the gap
    pub fn require(&self, year: i32) -> Result<f64> {
        self.get(year).ok_or_else(|| {
            ForecastError::ConfigurationError(format!("No ground truth supplied for {}", year))
        })
    }

    /// Years with a value, ascending
    pub fn years(&self) -> Vec<i32> {
        self.values.keys().copied().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Row of the combined per-country dataset
#[derive(Debug, Deserialize)]
struct CountryRecord {
    #[serde(rename = "Country Name")]
    country: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "No of Suicides")]
    suicides: Option<f64>,
}

/// Row of an aggregated yearly file
#[derive(Debug, Serialize)]
struct AggregatedRecord {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "No of Suicides")]
    suicides: f64,
}

/// Per-country yearly totals loaded from the combined dataset
#[derive(Debug, Clone, Default)]
pub struct CountryDataset {
    /// country -> year -> summed count
    totals: BTreeMap<String, BTreeMap<i32, f64>>,
}

impl CountryDataset {
    /// Load the combined CSV and aggregate counts per country and year.
    ///
    /// Columns other than `Country Name`, `Year` and `No of Suicides` are
    /// ignored, as are rows with an empty count.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load the combined dataset from any reader
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut totals: BTreeMap<String, BTreeMap<i32, f64>> = BTreeMap::new();
        let mut rows = 0usize;

        for record in csv_reader.deserialize() {
            let record: CountryRecord = record?;
            rows += 1;
            let Some(count) = record.suicides else {
                continue;
            };
            *totals
                .entry(record.country)
                .or_default()
                .entry(record.year)
                .or_insert(0.0) += count;
        }

        tracing::debug!(rows, countries = totals.len(), "loaded combined dataset");

        Ok(Self { totals })
    }

    /// Countries present in the dataset
    pub fn countries(&self) -> Vec<&str> {
        self.totals.keys().map(String::as_str).collect()
    }

    /// Yearly totals summed over every country.
    ///
    /// A year appears once any country reports a count for it.
    pub fn global_series(&self) -> Result<TimeSeries> {
        let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
        for years in self.totals.values() {
            for (&year, &value) in years {
                *totals.entry(year).or_insert(0.0) += value;
            }
        }
        TimeSeries::from_pairs("Global", totals)
    }

    /// Yearly totals for one country
    pub fn series_for(&self, country: &str) -> Result<TimeSeries> {
        let years = self.totals.get(country).ok_or_else(|| {
            ForecastError::DataError(format!("Country '{}' not found in dataset", country))
        })?;
        TimeSeries::from_pairs(country, years.iter().map(|(&y, &v)| (y, v)))
    }
}

impl SeriesProvider for CountryDataset {
    fn series(&self, entity: &str) -> Result<TimeSeries> {
        self.series_for(entity)
    }
}

/// Write a `Year,No of Suicides` file for an aggregated series
pub fn write_aggregated_csv<P: AsRef<Path>>(series: &TimeSeries, path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for o in series.observations() {
        writer.serialize(AggregatedRecord {
            year: o.year,
            suicides: o.value,
        })?;
    }
    writer.flush()?;
    Ok(())
}
