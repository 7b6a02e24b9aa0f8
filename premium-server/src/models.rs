//! Model loading
//!
//! The regression model is mandatory: a missing or broken file aborts
//! startup. The anomaly model and the explainer background are optional;
//! when absent or rejected the corresponding pipeline stage is skipped and
//! `/health` reports why.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use premium_core::logic::explain::{BaselineShapleyExplainer, FeatureBackground};
use premium_core::logic::model::{ArtifactError, IsolationForest, ModelMetadata, OnnxRegressor, RegressionOracle};
use premium_core::{PipelineOptions, PredictionPipeline};
use serde::Serialize;

use crate::config::Config;

/// Load state of one artifact, as reported by `/health`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Loaded { metadata: ModelMetadata },
    Missing { path: String },
    Rejected { path: String, reason: String },
}

impl ArtifactStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub regressor: ArtifactStatus,
    pub anomaly: ArtifactStatus,
    pub explainer: ArtifactStatus,
}

impl ModelStatus {
    pub fn is_degraded(&self) -> bool {
        !(self.regressor.is_loaded() && self.anomaly.is_loaded() && self.explainer.is_loaded())
    }
}

/// Build the prediction pipeline from the configured artifact paths
pub fn load_pipeline(config: &Config) -> anyhow::Result<(PredictionPipeline, ModelStatus)> {
    let regressor = OnnxRegressor::load(&config.premium_model_path).with_context(|| {
        format!(
            "failed to load premium model from {}",
            config.premium_model_path.display()
        )
    })?;
    let regressor_status = ArtifactStatus::Loaded {
        metadata: regressor.metadata().clone(),
    };
    let regressor: Arc<dyn RegressionOracle> = Arc::new(regressor);

    let options = PipelineOptions {
        top_k: config.top_k,
        currency_symbol: config.currency_symbol.clone(),
    };
    let mut pipeline = PredictionPipeline::new(regressor.clone()).with_options(options);

    let anomaly_status = match optional(&config.fraud_model_path, "anomaly model", |p| IsolationForest::load(p)) {
        Ok((forest, metadata)) => {
            tracing::info!(
                "Anomaly model ready: {} trees, offset {:.4}",
                forest.n_trees(),
                forest.offset
            );
            pipeline = pipeline.with_anomaly(Arc::new(forest));
            ArtifactStatus::Loaded { metadata }
        }
        Err(status) => status,
    };

    let explainer_status = match optional(&config.background_path, "explainer background", |p| FeatureBackground::load(p)) {
        Ok((background, metadata)) => {
            tracing::info!("Explainer ready: background of {} rows", background.rows);
            let explainer = BaselineShapleyExplainer::new(regressor, background.vector());
            pipeline = pipeline.with_explainer(Arc::new(explainer));
            ArtifactStatus::Loaded { metadata }
        }
        Err(status) => status,
    };

    Ok((
        pipeline,
        ModelStatus {
            regressor: regressor_status,
            anomaly: anomaly_status,
            explainer: explainer_status,
        },
    ))
}

/// Load an optional artifact, turning any failure into a status
fn optional<T>(
    path: &Path,
    what: &str,
    load: impl FnOnce(&Path) -> Result<(T, ModelMetadata), ArtifactError>,
) -> Result<(T, ModelMetadata), ArtifactStatus> {
    let shown = path.display().to_string();
    match load(path) {
        Ok(loaded) => Ok(loaded),
        Err(ArtifactError::NotFound(_)) => {
            tracing::warn!("No {} at {}; stage disabled", what, shown);
            Err(ArtifactStatus::Missing { path: shown })
        }
        Err(e) => {
            tracing::warn!("Rejected {} at {}: {}; stage disabled", what, shown, e);
            Err(ArtifactStatus::Rejected {
                path: shown,
                reason: e.to_string(),
            })
        }
    }
}
