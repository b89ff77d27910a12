// Runs the full pipeline on a synthetic series shaped like Japan's 1950-2020 counts
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use suicide_forecast::{
    ForecastPipeline, GroundTruthTable, PipelineConfig, PipelineReport, TimeSeries,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 400.0)?;

    let training = TimeSeries::from_pairs(
        "Japan (synthetic)",
        (1950..=2020).map(|year| {
            let trend = if year <= 1998 {
                16_000.0 + 330.0 * (year - 1950) as f64
            } else {
                31_800.0 - 500.0 * (year - 1998) as f64
            };
            let cycle = 1_000.0 * (2.0 * std::f64::consts::PI * (year - 1950) as f64 / 12.0).sin();
            (year, trend + cycle + noise.sample(&mut rng))
        }),
    )?;

    println!("Training on {} years", training.len());

    let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
    let outcome = pipeline.run(&training, &GroundTruthTable::japan_reference())?;

    print!("{}", PipelineReport::from_outcome(&outcome).render_text());
    Ok(())
}
