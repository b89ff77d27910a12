use count_forecast::config::PipelineConfig;
use count_forecast::data::{CountryDataset, GroundTruthTable};
use count_forecast::models::ModelVariant;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Usage: compare_models <combined.csv> [country]
    let mut args = std::env::args().skip(1);
    let csv_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/combined_processed_data.csv"));
    let country = args.next().unwrap_or_else(|| "Japan".to_string());

    println!("Loading data from: {}", csv_path.display());
    let dataset = CountryDataset::from_csv(&csv_path)?;
    let (training, _) = dataset.series_for(&country)?.split_at_year(2020);
    println!("Loaded {} years for {}", training.len(), country);

    let config = PipelineConfig::default();
    let truth = GroundTruthTable::reference_for(&country)?;

    for model in ModelVariant::registry(&config)? {
        let fitted = model.fit(&training)?;
        let forecast = fitted.forecast(config.validation_years)?;

        println!("\n{}: {}", model.name(), fitted.describe());
        for (year, value) in truth.years().iter().zip(forecast.values()) {
            let actual = truth.require(*year)?;
            println!("  {}: {:.0} (actual {:.0})", year, value, actual);
        }
    }

    Ok(())
}
