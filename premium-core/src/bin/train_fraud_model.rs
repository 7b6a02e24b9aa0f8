//! Offline trainer for the anomaly oracle and the explainer background

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use premium_core::constants::{DEFAULT_BACKGROUND_PATH, DEFAULT_FRAUD_MODEL_PATH, DEFAULT_TRAINING_DATA_PATH};
use premium_core::logic::model::{Contamination, IsolationForestConfig, MaxSamples};
use premium_core::logic::training::{self, TrainingOptions};

#[derive(Debug, Parser)]
#[command(name = "train-fraud-model", version, about = "Fit the isolation forest used to flag unusual applications")]
struct Args {
    /// Insurance CSV (age, sex, bmi, children, smoker, region, charges)
    #[arg(long, env = "TRAINING_DATA_PATH", default_value = DEFAULT_TRAINING_DATA_PATH)]
    data: PathBuf,

    /// Where to write the fitted forest
    #[arg(long, env = "FRAUD_MODEL_PATH", default_value = DEFAULT_FRAUD_MODEL_PATH)]
    output: PathBuf,

    /// Where to write the mean feature vector used by the explainer
    #[arg(long, env = "EXPLAINER_BACKGROUND_PATH", default_value = DEFAULT_BACKGROUND_PATH)]
    background_output: PathBuf,

    /// Expected outlier fraction, or `auto`
    #[arg(long, default_value = "0.05")]
    contamination: Contamination,

    #[arg(long, default_value_t = 200)]
    n_estimators: usize,

    /// `auto`, a row count, or a fraction of the dataset
    #[arg(long, default_value = "auto")]
    max_samples: MaxSamples,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = TrainingOptions {
        data_path: args.data,
        output_path: args.output,
        background_path: args.background_output,
        forest: IsolationForestConfig {
            n_estimators: args.n_estimators,
            max_samples: args.max_samples,
            contamination: args.contamination,
            seed: args.seed,
        },
    };

    match training::train(&options) {
        Ok(report) => {
            println!(
                "Saved {} ({} trees, psi={}, {} of {} rows flagged, layout {:08x})",
                report.output_path.display(),
                report.trees,
                report.max_samples,
                report.flagged,
                report.rows,
                report.layout_hash
            );
            println!("Saved {}", report.background_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Training failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
