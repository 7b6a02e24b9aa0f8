//! Baseline Shapley explainer
//!
//! Exact Shapley values of the regression model against one background
//! point. With six features there are only 2^6 = 64 coalitions, so every
//! coalition is scored in a single batch call. A feature outside the
//! coalition takes its background value.
//!
//! Contributions sum to `f(x) - f(background)`; the base value is
//! `f(background)`.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::Attribution;
use crate::logic::features::{FeatureVector, LayoutInfo, FEATURE_COUNT};
use crate::logic::model::artifact::{self, ArtifactError, ModelMetadata};
use crate::logic::model::{Explainer, InferenceError, RegressionOracle};

const COALITIONS: usize = 1 << FEATURE_COUNT;

// ============================================================================
// BACKGROUND ARTIFACT
// ============================================================================

/// Reference point for attribution, written by the trainer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBackground {
    pub layout: LayoutInfo,
    pub values: [f64; FEATURE_COUNT],
    pub rows: usize,
    pub created_at: DateTime<Utc>,
}

impl FeatureBackground {
    pub fn new(values: [f64; FEATURE_COUNT], rows: usize) -> Self {
        Self {
            layout: LayoutInfo::current(),
            values,
            rows,
            created_at: Utc::now(),
        }
    }

    /// Column means of encoded training rows
    pub fn from_rows(rows: &[[f64; FEATURE_COUNT]]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let mut sums = [0.0; FEATURE_COUNT];
        for row in rows {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value;
            }
        }
        let n = rows.len() as f64;
        Some(Self::new(sums.map(|s| s / n), rows.len()))
    }

    pub fn vector(&self) -> FeatureVector {
        FeatureVector::from_values(self.values)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        artifact::write_json(path.as_ref(), self)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<(Self, ModelMetadata), ArtifactError> {
        let path = path.as_ref();
        let (background, metadata): (Self, _) = artifact::read_json(path, "feature-background")?;
        background.layout.validate().map_err(|source| ArtifactError::Layout {
            path: path.to_path_buf(),
            source,
        })?;
        if background.values.iter().any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid {
                path: path.to_path_buf(),
                reason: "background contains non-finite values".to_string(),
            });
        }
        Ok((background, metadata))
    }
}

// ============================================================================
// EXPLAINER
// ============================================================================

pub struct BaselineShapleyExplainer {
    model: Arc<dyn RegressionOracle>,
    background: FeatureVector,
    /// weight[s] = s! (n - s - 1)! / n!
    weights: [f64; FEATURE_COUNT],
}

impl BaselineShapleyExplainer {
    pub fn new(model: Arc<dyn RegressionOracle>, background: FeatureVector) -> Self {
        Self {
            model,
            background,
            weights: shapley_weights(),
        }
    }

    /// Features in `mask` come from `x`, the rest from the background
    fn blend(&self, x: &FeatureVector, mask: usize) -> FeatureVector {
        let mut values = self.background.values;
        for (i, value) in values.iter_mut().enumerate() {
            if mask & (1 << i) != 0 {
                *value = x.values[i];
            }
        }
        FeatureVector::from_values(values)
    }
}

impl Explainer for BaselineShapleyExplainer {
    fn explain(&self, features: &FeatureVector) -> Result<Attribution, InferenceError> {
        let rows: Vec<FeatureVector> = (0..COALITIONS).map(|mask| self.blend(features, mask)).collect();
        let values = self.model.predict_batch(&rows)?;
        if values.len() != COALITIONS {
            return Err(InferenceError::Output(format!(
                "expected {} coalition scores, got {}",
                COALITIONS,
                values.len()
            )));
        }

        let mut contributions = vec![0.0; FEATURE_COUNT];
        for (mask, value) in values.iter().enumerate() {
            let size = mask.count_ones() as usize;
            for (i, contribution) in contributions.iter_mut().enumerate() {
                let bit = 1 << i;
                if mask & bit == 0 {
                    *contribution += self.weights[size] * (values[mask | bit] - value);
                }
            }
        }

        Ok(Attribution {
            contributions,
            base_value: values[0],
        })
    }

    fn name(&self) -> &str {
        "baseline-shapley"
    }
}

fn shapley_weights() -> [f64; FEATURE_COUNT] {
    let factorial = |k: usize| (1..=k).map(|v| v as f64).product::<f64>();
    let n = FEATURE_COUNT;
    let mut weights = [0.0; FEATURE_COUNT];
    for (size, weight) in weights.iter_mut().enumerate() {
        *weight = factorial(size) * factorial(n - size - 1) / factorial(n);
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingRegressor, LinearRegressor};

    struct Interaction;

    impl RegressionOracle for Interaction {
        fn predict(&self, x: &FeatureVector) -> Result<f64, InferenceError> {
            Ok(250.0 * x.age() + 20_000.0 * x.smoker_code() + 600.0 * x.bmi() * x.smoker_code())
        }
    }

    #[test]
    fn test_weights_sum_per_feature() {
        // Σ over subsets of the other 5 features: Σ C(5, s) * w(s) = 1
        let weights = shapley_weights();
        let binomial = [1.0, 5.0, 10.0, 10.0, 5.0, 1.0];
        let total: f64 = weights.iter().zip(binomial).map(|(w, c)| w * c).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_model_contributions_are_weighted_deltas() {
        let weights = [260.0, -130.0, 330.0, 475.0, 23_800.0, -350.0];
        let model = Arc::new(LinearRegressor::new(weights, -12_000.0));
        let background = FeatureVector::from_values([39.2, 0.5, 30.7, 1.1, 0.2, 1.5]);
        let explainer = BaselineShapleyExplainer::new(model, background.clone());

        let x = FeatureVector::from_values([52.0, 1.0, 34.0, 2.0, 1.0, 3.0]);
        let attribution = explainer.explain(&x).unwrap();

        for i in 0..FEATURE_COUNT {
            let expected = weights[i] * (x.values[i] - background.values[i]);
            assert!((attribution.contributions[i] - expected).abs() < 1e-6, "feature {i}");
        }
    }

    #[test]
    fn test_contributions_sum_to_prediction_delta() {
        let model: Arc<dyn RegressionOracle> = Arc::new(Interaction);
        let background = FeatureVector::from_values([40.0, 0.5, 30.0, 1.0, 0.2, 1.5]);
        let explainer = BaselineShapleyExplainer::new(model.clone(), background.clone());

        let x = FeatureVector::from_values([61.0, 1.0, 36.5, 0.0, 1.0, 2.0]);
        let attribution = explainer.explain(&x).unwrap();

        let fx = model.predict(&x).unwrap();
        let base = model.predict(&background).unwrap();
        let total: f64 = attribution.contributions.iter().sum();
        assert!((attribution.base_value - base).abs() < 1e-9);
        assert!((total - (fx - base)).abs() < 1e-6);
        // children, sex and region play no part in this model
        assert!(attribution.contributions[1].abs() < 1e-9);
        assert!(attribution.contributions[3].abs() < 1e-9);
    }

    #[test]
    fn test_model_failure_propagates() {
        let explainer = BaselineShapleyExplainer::new(
            Arc::new(FailingRegressor::new("session poisoned")),
            FeatureVector::new(),
        );
        assert!(explainer.explain(&FeatureVector::new()).is_err());
    }

    #[test]
    fn test_background_from_rows_is_mean() {
        let background = FeatureBackground::from_rows(&[
            [20.0, 0.0, 20.0, 0.0, 0.0, 0.0],
            [40.0, 1.0, 30.0, 2.0, 1.0, 3.0],
        ])
        .unwrap();
        assert_eq!(background.values, [30.0, 0.5, 25.0, 1.0, 0.5, 1.5]);
        assert_eq!(background.rows, 2);
        assert!(FeatureBackground::from_rows(&[]).is_none());
    }

    #[test]
    fn test_background_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_background.json");
        FeatureBackground::new([39.2, 0.5, 30.6, 1.1, 0.2, 1.5], 1338).save(&path).unwrap();

        let (loaded, _) = FeatureBackground::load(&path).unwrap();
        assert_eq!(loaded.values[2], 30.6);
        assert_eq!(loaded.vector().values, loaded.values);
    }
}
