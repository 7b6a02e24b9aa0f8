//! Model Module - Oracle Interfaces
//!
//! The pipeline only ever talks to these traits. Concrete engines (ONNX
//! regressor, isolation forest) live in submodules and can be swapped for
//! in-memory doubles in tests.

pub mod artifact;
pub mod iforest;
pub mod inference;

use crate::logic::explain::Attribution;
use crate::logic::features::FeatureVector;

// Re-export common types
pub use artifact::{ArtifactError, ModelMetadata};
pub use iforest::{Contamination, FitError, IsolationForest, IsolationForestConfig, MaxSamples};
pub use inference::OnnxRegressor;

/// Label the anomaly oracle returns for a flagged input
pub const ANOMALY_SENTINEL: i32 = -1;

/// Label the anomaly oracle returns for a normal input
pub const INLIER_LABEL: i32 = 1;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("model not loaded: {0}")]
    NotLoaded(String),

    #[error("invalid model input: {0}")]
    InvalidInput(String),

    #[error("inference failed: {0}")]
    Runtime(String),

    #[error("unexpected model output: {0}")]
    Output(String),
}

// ============================================================================
// ORACLE TRAITS
// ============================================================================

/// Premium regression model
pub trait RegressionOracle: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError>;

    /// Score many rows at once; engines with a batch API should override
    fn predict_batch(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    fn name(&self) -> &str {
        "regressor"
    }
}

/// Anomaly-detection model with an sklearn-style interface
pub trait AnomalyOracle: Send + Sync {
    /// Continuous score, higher = more normal, negative = outlier side
    fn decision_function(&self, features: &FeatureVector) -> Result<f64, InferenceError>;

    /// Binary label: `ANOMALY_SENTINEL` or `INLIER_LABEL`
    fn predict(&self, features: &FeatureVector) -> Result<i32, InferenceError>;

    fn name(&self) -> &str {
        "anomaly-detector"
    }
}

/// Per-feature attribution of a single prediction
pub trait Explainer: Send + Sync {
    fn explain(&self, features: &FeatureVector) -> Result<Attribution, InferenceError>;

    fn name(&self) -> &str {
        "explainer"
    }
}
