//! Inference Engine - ONNX Runtime Integration
//!
//! Loads the premium regression model (an sklearn regressor exported to
//! ONNX) and runs it on `[n, FEATURE_COUNT]` f32 batches.

use std::path::Path;
use std::time::Instant;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::artifact::{self, ArtifactError, ModelMetadata};
use super::{InferenceError, RegressionOracle};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

/// ONNX-backed premium regressor
///
/// `Session::run` needs `&mut`, so the session sits behind a mutex; the
/// regressor itself is shared read-only across requests.
pub struct OnnxRegressor {
    session: Mutex<Session>,
    output_name: String,
    metadata: ModelMetadata,
}

impl OnnxRegressor {
    /// Load ONNX model from file
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = model_path.as_ref();
        log::info!("Loading ONNX model from: {}", path.display());

        let bytes = artifact::read_bytes(path)?;
        let mut regressor = Self::from_bytes(&bytes)?;
        regressor.metadata = ModelMetadata::new(path, "onnx-regressor", &bytes);

        log::info!(
            "ONNX model loaded (sha256 {}, output '{}')",
            regressor.metadata.sha256,
            regressor.output_name
        );
        Ok(regressor)
    }

    /// Load ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, ArtifactError> {
        let session = Session::builder()
            .map_err(|e| ArtifactError::Runtime(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ArtifactError::Runtime(format!("Failed to set optimization: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| ArtifactError::Runtime(format!("Failed to load model: {}", e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ArtifactError::Runtime("No output defined".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            metadata: ModelMetadata::new(Path::new("<memory>"), "onnx-regressor", model_bytes),
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn run(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let start_time = Instant::now();

        let mut input_data = Vec::with_capacity(rows.len() * FEATURE_COUNT);
        for row in rows {
            input_data.extend_from_slice(&row.to_f32());
        }

        let input_array = Array2::<f32>::from_shape_vec((rows.len(), FEATURE_COUNT), input_data)
            .map_err(|e| InferenceError::InvalidInput(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::InvalidInput(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError::Output(format!("missing output '{}'", self.output_name)))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Output(format!("Extract error: {}", e)))?;

        if data.len() < rows.len() {
            return Err(InferenceError::Output(format!(
                "expected {} predictions, got {}",
                rows.len(),
                data.len()
            )));
        }

        let predictions: Vec<f64> = data.iter().take(rows.len()).map(|v| f64::from(*v)).collect();

        log::debug!(
            "ONNX batch of {} scored in {}us",
            rows.len(),
            start_time.elapsed().as_micros()
        );
        Ok(predictions)
    }
}

impl RegressionOracle for OnnxRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        self.run(std::slice::from_ref(features))?
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::Output("empty prediction".to_string()))
    }

    fn predict_batch(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, InferenceError> {
        self.run(rows)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
