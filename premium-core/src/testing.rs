//! In-memory oracle doubles
//!
//! Compiled for this crate's tests and for downstream crates that enable the
//! `testing` feature.

use crate::logic::explain::Attribution;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};
use crate::logic::model::{AnomalyOracle, Explainer, InferenceError, RegressionOracle};

// ============================================================================
// REGRESSION
// ============================================================================

/// Always predicts the same premium
#[derive(Debug, Clone)]
pub struct FixedRegressor {
    value: f64,
}

impl FixedRegressor {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl RegressionOracle for FixedRegressor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, InferenceError> {
        Ok(self.value)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// `intercept + Σ weight_i * x_i`
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    weights: [f64; FEATURE_COUNT],
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(weights: [f64; FEATURE_COUNT], intercept: f64) -> Self {
        Self { weights, intercept }
    }
}

impl RegressionOracle for LinearRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        Ok(self.intercept
            + self
                .weights
                .iter()
                .zip(features.values.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }

    fn name(&self) -> &str {
        "linear"
    }
}

#[derive(Debug, Clone)]
pub struct FailingRegressor {
    message: String,
}

impl FailingRegressor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl RegressionOracle for FailingRegressor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, InferenceError> {
        Err(InferenceError::Runtime(self.message.clone()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ============================================================================
// ANOMALY
// ============================================================================

/// Returns a fixed decision score and label
#[derive(Debug, Clone)]
pub struct FixedAnomaly {
    decision: f64,
    label: i32,
}

impl FixedAnomaly {
    pub fn new(decision: f64, label: i32) -> Self {
        Self { decision, label }
    }
}

impl AnomalyOracle for FixedAnomaly {
    fn decision_function(&self, _features: &FeatureVector) -> Result<f64, InferenceError> {
        Ok(self.decision)
    }

    fn predict(&self, _features: &FeatureVector) -> Result<i32, InferenceError> {
        Ok(self.label)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[derive(Debug, Clone)]
pub struct FailingAnomaly {
    message: String,
}

impl FailingAnomaly {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl AnomalyOracle for FailingAnomaly {
    fn decision_function(&self, _features: &FeatureVector) -> Result<f64, InferenceError> {
        Err(InferenceError::Runtime(self.message.clone()))
    }

    fn predict(&self, _features: &FeatureVector) -> Result<i32, InferenceError> {
        Err(InferenceError::Runtime(self.message.clone()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ============================================================================
// EXPLAINER
// ============================================================================

#[derive(Debug, Clone)]
pub struct FixedExplainer {
    attribution: Attribution,
}

impl FixedExplainer {
    pub fn new(attribution: Attribution) -> Self {
        Self { attribution }
    }
}

impl Explainer for FixedExplainer {
    fn explain(&self, _features: &FeatureVector) -> Result<Attribution, InferenceError> {
        Ok(self.attribution.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[derive(Debug, Clone)]
pub struct FailingExplainer {
    message: String,
}

impl FailingExplainer {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Explainer for FailingExplainer {
    fn explain(&self, _features: &FeatureVector) -> Result<Attribution, InferenceError> {
        Err(InferenceError::Runtime(self.message.clone()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
