//! Training Module - Offline Anomaly Model Builder
//!
//! Reads the insurance dataset, fits the isolation forest and writes two
//! artifacts next to the premium model:
//! - the forest itself (anomaly oracle)
//! - the mean feature vector (explainer background)
//!
//! Both carry the current layout hash so the server refuses them once the
//! encoding changes.

pub mod dataset;
#[cfg(test)]
mod tests;

use std::path::PathBuf;

use serde::Serialize;

use crate::constants::{DEFAULT_BACKGROUND_PATH, DEFAULT_FRAUD_MODEL_PATH, DEFAULT_TRAINING_DATA_PATH};
use crate::logic::explain::FeatureBackground;
use crate::logic::model::iforest::Row;
use crate::logic::model::{ArtifactError, FitError, IsolationForest, IsolationForestConfig};

pub use dataset::{load_rows, read_rows, InsuranceRecord};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: unknown {field} value {value:?}")]
    UnknownCategory {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("dataset contains no rows")]
    EmptyDataset,

    #[error("fit failed: {0}")]
    Fit(#[from] FitError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

// ============================================================================
// TRAINING
// ============================================================================

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub data_path: PathBuf,
    pub output_path: PathBuf,
    pub background_path: PathBuf,
    pub forest: IsolationForestConfig,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_TRAINING_DATA_PATH),
            output_path: PathBuf::from(DEFAULT_FRAUD_MODEL_PATH),
            background_path: PathBuf::from(DEFAULT_BACKGROUND_PATH),
            forest: IsolationForestConfig::default(),
        }
    }
}

/// Summary printed by the trainer binary
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub trees: usize,
    pub max_samples: usize,
    pub offset: f64,
    /// Training rows the fitted forest flags
    pub flagged: usize,
    pub layout_hash: u32,
    pub output_path: PathBuf,
    pub background_path: PathBuf,
}

/// Fit the forest and the background on already-encoded rows
pub fn fit(rows: &[Row], config: IsolationForestConfig) -> Result<(IsolationForest, FeatureBackground), TrainingError> {
    let forest = IsolationForest::fit(rows, config)?;
    let background = FeatureBackground::from_rows(rows).ok_or(TrainingError::EmptyDataset)?;
    Ok((forest, background))
}

/// Full offline run: load, fit, persist
pub fn train(options: &TrainingOptions) -> Result<TrainingReport, TrainingError> {
    let rows = load_rows(&options.data_path)?;
    let (forest, background) = fit(&rows, options.forest.clone())?;

    let flagged = count_flagged(&forest, &rows);
    log::info!(
        "Flagged {} of {} training rows ({:.2}%)",
        flagged,
        rows.len(),
        100.0 * flagged as f64 / rows.len() as f64
    );

    forest.save(&options.output_path)?;
    log::info!("Saved anomaly model to {}", options.output_path.display());
    background.save(&options.background_path)?;
    log::info!("Saved explainer background to {}", options.background_path.display());

    Ok(TrainingReport {
        rows: rows.len(),
        trees: forest.n_trees(),
        max_samples: forest.max_samples,
        offset: forest.offset,
        flagged,
        layout_hash: forest.layout.hash,
        output_path: options.output_path.clone(),
        background_path: options.background_path.clone(),
    })
}

fn count_flagged(forest: &IsolationForest, rows: &[Row]) -> usize {
    rows.iter()
        .filter(|row| {
            forest
                .score_samples(row)
                .map(|score| score - forest.offset < 0.0)
                .unwrap_or(false)
        })
        .count()
}

