//! Offline training: fits the performance model and writes `saved_model/`
//!
//! Run with: cargo run --bin train -- --data data/mock_ads.csv

use std::path::PathBuf;

use clap::Parser;

use ethical_ads::init_tracing;
use ethical_ads::logic::features::ImageTextPolicy;
use ethical_ads::logic::model::GbmParams;
use ethical_ads::logic::training::{self, TrainingConfig};

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the ad performance model")]
struct Args {
    /// Historical ads CSV (ad_id,ad_text,image_url,impressions,spend)
    #[arg(long, default_value = "data/mock_ads.csv")]
    data: PathBuf,

    /// Output directory for model.json and model_columns.json
    #[arg(long, default_value = "saved_model")]
    output: PathBuf,

    /// Random seed for the train/test split
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Held-out fraction
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    #[arg(long, default_value_t = 100)]
    trees: usize,

    #[arg(long, default_value_t = 0.1)]
    learning_rate: f64,

    #[arg(long, default_value_t = 6)]
    max_depth: usize,

    /// `any_url` or `contains:<marker>`
    #[arg(long, default_value = "any_url")]
    image_text_policy: ImageTextPolicy,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("ethical_ads=info,train=info");

    let args = Args::parse();
    let config = TrainingConfig {
        data_path: args.data,
        output_dir: args.output,
        test_size: args.test_size,
        seed: args.seed,
        params: GbmParams {
            n_estimators: args.trees,
            learning_rate: args.learning_rate,
            max_depth: args.max_depth,
            ..Default::default()
        },
        image_policy: args.image_text_policy,
    };

    let report = training::run(&config)?;

    println!("Model Evaluation on Test Set:");
    match report.metrics {
        Some(m) => {
            println!("Mean Absolute Error (MAE): {:.2}", m.mae);
            println!("R-squared (R2): {:.2}", m.r2);
        }
        None => println!("(no test rows)"),
    }
    println!("Trained on {} rows, evaluated on {}", report.train_rows, report.test_rows);
    println!("\nModel and columns saved successfully in '{}'.", config.output_dir.display());

    Ok(())
}
