//! # forecast_country
//!
//! Validates Holt-Winters and seasonal ARIMA on one country's yearly counts
//! and prints the projection of the better model. `--decompose` and
//! `--global-summary` print exploratory views of the dataset instead.

use clap::Parser;
use count_forecast::analysis::{GlobalSummary, SeriesDecomposition};
use count_forecast::config::PipelineConfig;
use count_forecast::data::{write_aggregated_csv, CountryDataset, GroundTruthTable};
use count_forecast::error::{ForecastError, Result};
use count_forecast::pipeline::ForecastPipeline;
use count_forecast::report::PipelineReport;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "forecast_country")]
#[command(about = "Validated yearly count forecasting for one country", long_about = None)]
struct Cli {
    /// Combined dataset (CSV with `Country Name`, `Year`, `No of Suicides`)
    #[arg(short, long)]
    input: PathBuf,

    /// Country to forecast
    #[arg(short, long, required_unless_present = "global_summary")]
    country: Option<String>,

    /// Ground truth for the validation years as JSON (`{"2021": 20291, ...}`).
    /// Required unless the country is Japan, which has a curated table.
    #[arg(short, long)]
    ground_truth: Option<PathBuf>,

    /// Pipeline configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Projection length counted from the end of the training window
    #[arg(long)]
    horizon: Option<usize>,

    /// Last year used for training; later observations are ignored
    #[arg(long)]
    train_end: Option<i32>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Also write the aggregated yearly series to this CSV file
    #[arg(long)]
    aggregate_out: Option<PathBuf>,

    /// Print the additive decomposition of the country series instead of forecasting
    #[arg(long, conflicts_with = "global_summary")]
    decompose: bool,

    /// Print summary statistics of the all-country yearly total instead of forecasting
    #[arg(long)]
    global_summary: bool,
}

fn print_analysis<T: serde::Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", value);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(horizon) = cli.horizon {
        config.future_horizon = horizon;
    }

    let dataset = CountryDataset::from_csv(&cli.input)?;
    if cli.global_summary {
        let summary = GlobalSummary::from_series(&dataset.global_series()?)?;
        return print_analysis(&summary, cli.json);
    }

    let country = cli.country.as_deref().ok_or_else(|| {
        ForecastError::ConfigurationError("--country is required".to_string())
    })?;
    let series = dataset.series_for(country)?;

    if cli.decompose {
        let decomposition = SeriesDecomposition::new(&series, config.seasonal_period)?;
        return print_analysis(&decomposition, cli.json);
    }

    let ground_truth = match &cli.ground_truth {
        Some(path) => GroundTruthTable::from_json_file(path)?,
        None => GroundTruthTable::reference_for(country)?,
    };

    if let Some(path) = &cli.aggregate_out {
        write_aggregated_csv(&series, path)?;
        tracing::info!(path = %path.display(), "wrote aggregated series");
    }

    let training = match cli.train_end {
        Some(year) => series.split_at_year(year).0,
        None => series,
    };
    if training.is_empty() {
        return Err(ForecastError::DataError(format!(
            "No observations for {} in the training window",
            country
        )));
    }

    let pipeline = ForecastPipeline::new(config)?;
    let outcome = pipeline.run(&training, &ground_truth)?;
    let report = PipelineReport::from_outcome(&outcome);

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_country=info,count_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "forecast failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
