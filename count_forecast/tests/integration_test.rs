use count_forecast::config::PipelineConfig;
use count_forecast::data::{CountryDataset, GroundTruthTable, TimeSeries};
use count_forecast::models::auto_arima::AutoArima;
use count_forecast::models::arima::COEFFICIENT_BOUND;
use count_forecast::models::{ForecastModel, TrainedForecastModel};
use count_forecast::pipeline::ForecastPipeline;
use count_forecast::report::PipelineReport;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use series_math::polynomial::{is_invertible, is_stationary};
use std::io::Write;
use tempfile::NamedTempFile;

/// Rise to a peak in 1998, then decline, with a 12-year cycle and noise
fn rise_then_fall() -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(1998);
    let noise = Normal::new(0.0, 250.0).unwrap();

    TimeSeries::from_pairs(
        "Japan",
        (1950..=2020).map(|year| {
            let trend = if year <= 1998 {
                15_000.0 + 350.0 * (year - 1950) as f64
            } else {
                31_800.0 - 480.0 * (year - 1998) as f64
            };
            let cycle =
                900.0 * (2.0 * std::f64::consts::PI * (year - 1950) as f64 / 12.0).sin();
            (year, trend + cycle + noise.sample(&mut rng))
        }),
    )
    .unwrap()
}

#[test]
fn test_full_pipeline_workflow() {
    // 1. Training window 1950-2020
    let training = rise_then_fall();
    assert_eq!(training.len(), 71);

    // 2. Run with the reference configuration
    let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let outcome = pipeline
        .run(&training, &GroundTruthTable::japan_reference())
        .unwrap();

    // 3. Both models scored
    assert_eq!(outcome.validation_periods, vec![2021, 2022, 2023, 2024]);
    assert_eq!(outcome.scores.len(), 2);
    assert!(outcome.failures.is_empty());
    assert!(outcome
        .scores
        .iter()
        .all(|s| s.mean_percentage_error.is_finite()));

    // 4. The lower error wins
    let chosen = outcome.selection.chosen_score().mean_percentage_error;
    let rejected = outcome.selection.rejected_score().unwrap();
    assert!(chosen <= rejected);

    // 5. Projection 2021-2030 starts with the validated forecast
    let projection = &outcome.projection;
    assert_eq!(projection.years(), (2021..=2030).collect::<Vec<_>>());
    let validated: Vec<f64> = outcome
        .selection
        .chosen_score()
        .records
        .iter()
        .map(|r| r.predicted)
        .collect();
    assert_eq!(&projection.values()[..4], validated.as_slice());
    assert_eq!(projection.future().len(), 6);
    assert!(projection.points.iter().all(|p| p.lower.is_some()));
}

#[test]
fn test_selected_arima_is_stationary_and_invertible() {
    let config = PipelineConfig::default();
    let fitted = AutoArima::new(
        config.seasonal_period,
        config.seasonal_differencing,
        config.arima.clone(),
    )
    .unwrap()
    .fit(&rise_then_fall())
    .unwrap();

    let model = fitted.model();
    for block in [
        model.ar_coefficients(),
        model.ma_coefficients(),
        model.seasonal_ar_coefficients(),
        model.seasonal_ma_coefficients(),
    ] {
        assert!(
            block.iter().all(|c| c.abs() < COEFFICIENT_BOUND),
            "{} has a coefficient at the boundary: {:?}",
            fitted.describe(),
            block
        );
    }
    assert!(is_stationary(model.ar_coefficients()));
    assert!(is_stationary(model.seasonal_ar_coefficients()));
    assert!(is_invertible(model.ma_coefficients()));
    assert!(is_invertible(model.seasonal_ma_coefficients()));
    assert!(fitted.candidates().iter().all(|c| c.criterion.is_finite()));
}

#[test]
fn test_pipeline_is_deterministic() {
    let training = rise_then_fall();
    let truth = GroundTruthTable::japan_reference();
    let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();

    let first = pipeline.run(&training, &truth).unwrap();
    let second = pipeline.run(&training, &truth).unwrap();

    assert_eq!(first.scores, second.scores);
    assert_eq!(first.projection, second.projection);
    assert_eq!(
        first.selection.chosen_model_name(),
        second.selection.chosen_model_name()
    );
}

#[test]
fn test_csv_to_report() {
    // 1. Write a combined file with two rows per year
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Country Name,Year,Sex,No of Suicides").unwrap();
    for observation in rise_then_fall().observations() {
        let half = observation.value / 2.0;
        writeln!(file, "Japan,{},Male,{}", observation.year, half).unwrap();
        writeln!(file, "Japan,{},Female,{}", observation.year, half).unwrap();
    }
    writeln!(file, "Brazil,2000,Male,10").unwrap();
    file.flush().unwrap();

    // 2. Load and aggregate
    let dataset = CountryDataset::from_csv(file.path()).unwrap();
    let series = dataset.series_for("Japan").unwrap();
    assert_eq!(series.len(), 71);

    // 3. Run with a smaller search and render
    let mut config = PipelineConfig::default();
    config.arima.max_order = 2;
    config.arima.parallel_candidates = true;
    let outcome = ForecastPipeline::new(config)
        .unwrap()
        .run(&series, &GroundTruthTable::japan_reference())
        .unwrap();

    let report = PipelineReport::from_outcome(&outcome);
    let text = report.render_text();
    assert!(text.contains("FORECAST: Japan"));
    assert!(text.contains("MAPE Holt-Winters"));
    assert!(text.contains("MAPE ARIMA"));
    assert!(text.contains("PROJECTION 2025-2030"));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["series"], "Japan");
    assert_eq!(json["projection"].as_array().unwrap().len(), 10);
}
