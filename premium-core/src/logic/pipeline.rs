//! Prediction Pipeline
//!
//! ```text
//!   FeatureVector
//!        │
//!        ├──► anomaly oracle ──► flag / score      (optional, degrades)
//!        ├──► regression oracle ──► premium         (mandatory, fails)
//!        └──► explainer ──► top factors / base      (optional, degrades)
//! ```
//!
//! Optional stages never turn into errors. Their outcome is recorded in a
//! `StageStatus` so "nothing flagged" and "scoring broke" stay distinguishable.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::explain::{check_attribution, top_factors, TopFactor};
use super::features::{
    normalize, FeatureVector, LayoutMismatchError, RawApplicant, ValidationError,
};
use super::model::{AnomalyOracle, Explainer, InferenceError, RegressionOracle, ANOMALY_SENTINEL};
use super::presenter::round_to;
use crate::constants::{ANOMALY_SCORE_DECIMALS, DEFAULT_CURRENCY_SYMBOL, DEFAULT_TOP_K};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Premium as returned by the regression oracle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PremiumEstimate {
    Valid(f64),
    /// Negative or non-finite model output
    Degenerate(f64),
}

impl PremiumEstimate {
    pub fn from_prediction(value: f64) -> Self {
        if value.is_finite() && value >= 0.0 {
            Self::Valid(value)
        } else {
            Self::Degenerate(value)
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Self::Valid(v) | Self::Degenerate(v) => v,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Outcome of an optional pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    /// No oracle configured for this stage
    Unavailable,
    Failed(String),
}

impl StageStatus {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub premium_estimate: PremiumEstimate,
    pub anomaly_flag: bool,
    pub anomaly_score: Option<f64>,
    pub top_factors: Vec<TopFactor>,
    pub base_value: Option<f64>,
    pub anomaly_stage: StageStatus,
    pub explanation_stage: StageStatus,
}

impl PredictionResult {
    pub fn is_degraded(&self) -> bool {
        self.anomaly_stage.is_degraded() || self.explanation_stage.is_degraded()
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Vector was built against another feature layout
    #[error("{0}")]
    Layout(#[from] LayoutMismatchError),

    /// Regression oracle failed; carries the underlying cause
    #[error("{0}")]
    ModelInference(#[source] InferenceError),
}

/// Anything that ends a request in an error banner
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl PredictError {
    /// Banner text shown to the applicant
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Pipeline(err) => format!("Model error: {err}"),
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub currency_symbol: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

/// Oracles loaded once at startup, shared read-only across requests
#[derive(Clone)]
pub struct PredictionPipeline {
    regressor: Arc<dyn RegressionOracle>,
    anomaly: Option<Arc<dyn AnomalyOracle>>,
    explainer: Option<Arc<dyn Explainer>>,
    options: PipelineOptions,
}

impl PredictionPipeline {
    pub fn new(regressor: Arc<dyn RegressionOracle>) -> Self {
        Self {
            regressor,
            anomaly: None,
            explainer: None,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_anomaly(mut self, anomaly: Arc<dyn AnomalyOracle>) -> Self {
        self.anomaly = Some(anomaly);
        self
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Normalize raw fields, then run the pipeline
    pub fn predict_raw(&self, raw: &RawApplicant) -> Result<PredictionResult, PredictError> {
        let features = normalize(raw)?;
        Ok(self.predict(&features)?)
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PipelineError> {
        features.validate()?;
        let (anomaly_flag, anomaly_score, anomaly_stage) = self.score_anomaly(features);

        let prediction = self.regressor.predict(features).map_err(|err| {
            log::error!("Premium regression failed ({}): {}", self.regressor.name(), err);
            PipelineError::ModelInference(err)
        })?;
        let premium_estimate = PremiumEstimate::from_prediction(prediction);
        if !premium_estimate.is_valid() {
            log::warn!("Regression returned a degenerate premium: {}", prediction);
        }

        let (top_factors, base_value, explanation_stage) = self.explain(features);

        Ok(PredictionResult {
            premium_estimate,
            anomaly_flag,
            anomaly_score,
            top_factors,
            base_value,
            anomaly_stage,
            explanation_stage,
        })
    }

    fn score_anomaly(&self, features: &FeatureVector) -> (bool, Option<f64>, StageStatus) {
        let Some(oracle) = &self.anomaly else {
            return (false, None, StageStatus::Unavailable);
        };

        let scored = oracle
            .decision_function(features)
            .and_then(|decision| Ok((decision, oracle.predict(features)?)));

        match scored {
            Ok((decision, label)) => (
                label == ANOMALY_SENTINEL,
                Some(round_to(decision, ANOMALY_SCORE_DECIMALS)),
                StageStatus::Completed,
            ),
            Err(err) => {
                log::warn!("Anomaly scoring degraded ({}): {}", oracle.name(), err);
                (false, None, StageStatus::Failed(err.to_string()))
            }
        }
    }

    fn explain(&self, features: &FeatureVector) -> (Vec<TopFactor>, Option<f64>, StageStatus) {
        let Some(explainer) = &self.explainer else {
            return (Vec::new(), None, StageStatus::Unavailable);
        };

        let attribution = explainer
            .explain(features)
            .map_err(|err| err.to_string())
            .and_then(|attribution| check_attribution(&attribution).map(|_| attribution));

        match attribution {
            Ok(attribution) => (
                top_factors(&attribution, self.options.top_k, &self.options.currency_symbol),
                Some(attribution.base_value),
                StageStatus::Completed,
            ),
            Err(reason) => {
                log::warn!("Explanation degraded ({}): {}", explainer.name(), reason);
                (Vec::new(), None, StageStatus::Failed(reason))
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
