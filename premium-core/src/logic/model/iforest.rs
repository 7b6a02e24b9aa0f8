//! Isolation Forest - anomaly oracle
//!
//! Follows the scikit-learn estimator so models trained here score the same
//! way the serving side expects:
//! - each tree sees `ψ = max_samples` rows drawn without replacement
//! - splits pick a random non-constant feature and a uniform threshold
//! - depth is capped at `ceil(log2 ψ)`, leaves add `c(size)` to the path
//! - `score_samples = -2^(-E[h(x)] / c(ψ))`
//! - `offset` is the contamination percentile of the training scores
//! - `decision_function = score_samples - offset`, negative → anomaly

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::artifact::{self, ArtifactError, ModelMetadata};
use super::{AnomalyOracle, InferenceError, ANOMALY_SENTINEL, INLIER_LABEL};
use crate::logic::features::{FeatureVector, LayoutInfo, FEATURE_COUNT};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Offset used when contamination is `auto` (sklearn behaviour)
const AUTO_OFFSET: f64 = -0.5;

/// Subsample size used when max_samples is `auto`
const AUTO_MAX_SAMPLES: usize = 256;

pub type Row = [f64; FEATURE_COUNT];

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxSamples {
    Auto,
    Count(usize),
    Fraction(f64),
}

impl MaxSamples {
    /// Resolve against the training set size
    pub fn resolve(self, n_rows: usize) -> usize {
        let resolved = match self {
            Self::Auto => AUTO_MAX_SAMPLES.min(n_rows),
            Self::Count(count) => count.min(n_rows),
            Self::Fraction(fraction) => (fraction * n_rows as f64) as usize,
        };
        resolved.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contamination {
    Auto,
    Fraction(f64),
}

/// `auto`, an integer count, or a fraction such as `0.8`
impl FromStr for MaxSamples {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if let Ok(count) = s.parse::<usize>() {
            return Ok(Self::Count(count));
        }
        s.parse::<f64>()
            .map(Self::Fraction)
            .map_err(|_| format!("invalid max_samples {s:?}: expected auto, a count or a fraction"))
    }
}

impl FromStr for Contamination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<f64>()
            .map(Self::Fraction)
            .map_err(|_| format!("invalid contamination {s:?}: expected auto or a fraction"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestConfig {
    pub n_estimators: usize,
    pub max_samples: MaxSamples,
    pub contamination: Contamination,
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_samples: MaxSamples::Auto,
            contamination: Contamination::Fraction(0.05),
            seed: 42,
        }
    }
}

impl IsolationForestConfig {
    pub fn validate(&self) -> Result<(), FitError> {
        if self.n_estimators == 0 {
            return Err(FitError::NoEstimators);
        }
        if let Contamination::Fraction(c) = self.contamination {
            if !(c > 0.0 && c <= 0.5) {
                return Err(FitError::Contamination(c));
            }
        }
        match self.max_samples {
            MaxSamples::Count(0) => Err(FitError::ZeroMaxSamples),
            MaxSamples::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(FitError::MaxSamplesFraction(f))
            }
            _ => Ok(()),
        }
    }
}

/// Why an isolation forest could not be fitted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("n_estimators must be at least 1")]
    NoEstimators,

    #[error("contamination must be in (0, 0.5], got {0}")]
    Contamination(f64),

    #[error("max_samples must be at least 1")]
    ZeroMaxSamples,

    #[error("max_samples fraction must be in (0, 1], got {0}")]
    MaxSamplesFraction(f64),

    #[error("cannot fit an isolation forest on an empty dataset")]
    EmptyDataset,

    #[error("freshly grown tree is malformed")]
    MalformedTree,
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree, stored as a flat node arena rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn fit(data: &[Row], samples: &mut [usize], max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(data, samples, 0, max_depth, rng);
        tree
    }

    fn grow(
        &mut self,
        data: &[Row],
        samples: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: samples.len() });

        if depth >= max_depth || samples.len() <= 1 {
            return id;
        }

        // Only features that still vary inside this node can split it, and
        // only over a span a uniform draw can cover
        let candidates: Vec<(usize, f64, f64)> = (0..FEATURE_COUNT)
            .filter_map(|feature| {
                let (lo, hi) = samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(data[i][feature]), hi.max(data[i][feature]))
                });
                (hi > lo && (hi - lo).is_finite()).then_some((feature, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return id;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);

        let mut split = 0;
        for k in 0..samples.len() {
            if data[samples[k]][feature] <= threshold {
                samples.swap(k, split);
                split += 1;
            }
        }

        let (left_samples, right_samples) = samples.split_at_mut(split);
        let left = self.grow(data, left_samples, depth + 1, max_depth, rng);
        let right = self.grow(data, right_samples, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Depth of the leaf reached by `row`, plus the expected remaining depth
    fn path_length(&self, row: &Row) -> Option<f64> {
        let mut index = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes.get(index)? {
                Node::Leaf { size } => return Some(depth + average_path_length(*size)),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let next = if *row.get(*feature)? <= *threshold { *left } else { *right };
                    // Children always come after their parent in the arena
                    if next <= index {
                        return None;
                    }
                    index = next;
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

/// Trained isolation forest, persisted as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    pub layout: LayoutInfo,
    pub config: IsolationForestConfig,
    /// Resolved subsample size ψ
    pub max_samples: usize,
    pub offset: f64,
    pub training_rows: usize,
    pub trained_at: DateTime<Utc>,
    trees: Vec<IsolationTree>,
}

impl IsolationForest {
    /// Fit on encoded rows
    pub fn fit(data: &[Row], config: IsolationForestConfig) -> Result<Self, FitError> {
        config.validate()?;
        if data.is_empty() {
            return Err(FitError::EmptyDataset);
        }

        let n_rows = data.len();
        let max_samples = config.max_samples.resolve(n_rows);
        let max_depth = (max_samples.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = (0..config.n_estimators)
            .map(|_| {
                let mut samples = rand::seq::index::sample(&mut rng, n_rows, max_samples).into_vec();
                IsolationTree::fit(data, &mut samples, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            layout: LayoutInfo::current(),
            config,
            max_samples,
            offset: AUTO_OFFSET,
            training_rows: n_rows,
            trained_at: Utc::now(),
            trees,
        };

        if let Contamination::Fraction(c) = forest.config.contamination {
            let mut scores = data
                .iter()
                .map(|row| forest.score_row(row))
                .collect::<Option<Vec<f64>>>()
                .ok_or(FitError::MalformedTree)?;
            forest.offset = percentile(&mut scores, 100.0 * c);
        }

        log::info!(
            "Isolation forest fitted: {} trees, psi={}, offset={:.4}",
            forest.trees.len(),
            forest.max_samples,
            forest.offset
        );
        Ok(forest)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw anomaly score in [-1, 0); lower = more abnormal
    pub fn score_samples(&self, row: &Row) -> Result<f64, InferenceError> {
        self.score_row(row)
            .ok_or_else(|| InferenceError::Runtime("isolation tree is malformed".to_string()))
    }

    fn score_row(&self, row: &Row) -> Option<f64> {
        if self.trees.is_empty() {
            return None;
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.path_length(row)?;
        }
        let mean_depth = total / self.trees.len() as f64;
        let normaliser = average_path_length(self.max_samples).max(f64::MIN_POSITIVE);
        Some(-(2f64.powf(-mean_depth / normaliser)))
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        artifact::write_json(path.as_ref(), self)
    }

    /// Load a forest and reject it if it was trained on another layout
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, ModelMetadata), ArtifactError> {
        let path = path.as_ref();
        let (forest, metadata): (Self, _) = artifact::read_json(path, "isolation-forest")?;

        forest.layout.validate().map_err(|source| ArtifactError::Layout {
            path: path.to_path_buf(),
            source,
        })?;
        if forest.trees.is_empty() || forest.max_samples == 0 {
            return Err(ArtifactError::Invalid {
                path: path.to_path_buf(),
                reason: "forest has no trees".to_string(),
            });
        }

        log::info!(
            "Isolation forest loaded from {} ({} trees, sha256 {})",
            path.display(),
            forest.trees.len(),
            metadata.sha256
        );
        Ok((forest, metadata))
    }
}

impl AnomalyOracle for IsolationForest {
    fn decision_function(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        Ok(self.score_samples(features.as_array())? - self.offset)
    }

    fn predict(&self, features: &FeatureVector) -> Result<i32, InferenceError> {
        let decision = self.decision_function(features)?;
        Ok(if decision < 0.0 { ANOMALY_SENTINEL } else { INLIER_LABEL })
    }

    fn name(&self) -> &str {
        "isolation-forest"
    }
}

/// Linear-interpolated percentile (numpy default), `q` in [0, 100]
fn percentile(values: &mut [f64], q: f64) -> f64 {
    values.sort_by(f64::total_cmp);
    let last = values.len() - 1;
    let rank = (q / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(n: usize, seed: u64) -> Vec<Row> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                [
                    rng.gen_range(20.0..60.0),
                    f64::from(rng.gen_range(0u8..2)),
                    rng.gen_range(22.0..32.0),
                    f64::from(rng.gen_range(0u8..3)),
                    f64::from(rng.gen_range(0u8..2)),
                    f64::from(rng.gen_range(0u8..4)),
                ]
            })
            .collect()
    }

    fn small_config() -> IsolationForestConfig {
        IsolationForestConfig {
            n_estimators: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) ≈ 10.2448
        assert!((average_path_length(256) - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn test_percentile_interpolates() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&mut values, 50.0), 3.0);
        assert_eq!(percentile(&mut values, 0.0), 1.0);
        assert_eq!(percentile(&mut values, 100.0), 5.0);
        assert!((percentile(&mut values, 10.0) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_max_samples_resolution() {
        assert_eq!(MaxSamples::Auto.resolve(1000), 256);
        assert_eq!(MaxSamples::Auto.resolve(100), 100);
        assert_eq!(MaxSamples::Count(500).resolve(100), 100);
        assert_eq!(MaxSamples::Fraction(0.5).resolve(100), 50);
        assert_eq!(MaxSamples::Fraction(0.001).resolve(100), 1);
    }

    #[test]
    fn test_cli_values_parse() {
        assert_eq!("auto".parse::<MaxSamples>().unwrap(), MaxSamples::Auto);
        assert_eq!("128".parse::<MaxSamples>().unwrap(), MaxSamples::Count(128));
        assert_eq!("0.5".parse::<MaxSamples>().unwrap(), MaxSamples::Fraction(0.5));
        assert!("lots".parse::<MaxSamples>().is_err());

        assert_eq!("AUTO".parse::<Contamination>().unwrap(), Contamination::Auto);
        assert_eq!("0.05".parse::<Contamination>().unwrap(), Contamination::Fraction(0.05));
        assert!("".parse::<Contamination>().is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(IsolationForestConfig::default().validate().is_ok());
        let bad = IsolationForestConfig {
            contamination: Contamination::Fraction(0.7),
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(FitError::Contamination(0.7)));
        let bad = IsolationForestConfig {
            n_estimators: 0,
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(FitError::NoEstimators));
        let bad = IsolationForestConfig {
            max_samples: MaxSamples::Fraction(1.5),
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(FitError::MaxSamplesFraction(1.5)));
    }

    #[test]
    fn test_obvious_outlier_flagged() {
        let mut data = cluster(299, 7);
        data.push([95.0, 1.0, 70.0, 12.0, 1.0, 3.0]);
        let forest = IsolationForest::fit(&data, small_config()).unwrap();

        let outlier = FeatureVector::from_values([95.0, 1.0, 70.0, 12.0, 1.0, 3.0]);
        assert_eq!(forest.predict(&outlier).unwrap(), ANOMALY_SENTINEL);
        assert!(forest.decision_function(&outlier).unwrap() < 0.0);

        let typical = FeatureVector::from_values([40.0, 0.0, 27.0, 1.0, 0.0, 1.0]);
        assert!(
            forest.decision_function(&typical).unwrap() > forest.decision_function(&outlier).unwrap()
        );
    }

    #[test]
    fn test_contamination_bounds_flagged_fraction() {
        let data = cluster(400, 11);
        let forest = IsolationForest::fit(&data, small_config()).unwrap();

        let flagged = data
            .iter()
            .filter(|row| {
                forest.predict(&FeatureVector::from_values(**row)).unwrap() == ANOMALY_SENTINEL
            })
            .count();
        // 5% of 400 = 20, interpolation can move the cut by one row
        assert!((15..=21).contains(&flagged), "flagged {flagged}");
    }

    #[test]
    fn test_fit_is_deterministic_for_seed() {
        let data = cluster(120, 3);
        let a = IsolationForest::fit(&data, small_config()).unwrap();
        let b = IsolationForest::fit(&data, small_config()).unwrap();
        assert_eq!(a.trees, b.trees);
        assert_eq!(a.offset, b.offset);
    }

    #[test]
    fn test_auto_contamination_uses_fixed_offset() {
        let config = IsolationForestConfig {
            contamination: Contamination::Auto,
            n_estimators: 10,
            ..Default::default()
        };
        let forest = IsolationForest::fit(&cluster(50, 1), config).unwrap();
        assert_eq!(forest.offset, AUTO_OFFSET);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert_eq!(
            IsolationForest::fit(&[], small_config()).unwrap_err(),
            FitError::EmptyDataset
        );
    }

    #[test]
    fn test_constant_dataset_scores() {
        let data = vec![[30.0, 1.0, 25.0, 0.0, 0.0, 0.0]; 20];
        let forest = IsolationForest::fit(&data, small_config()).unwrap();
        let score = forest.score_samples(&data[0]).unwrap();
        assert!(score < 0.0 && score >= -1.0);
    }

    #[test]
    fn test_extreme_spans_fit_without_panicking() {
        let data = vec![
            [-1e308, 0.0, 20.0, 0.0, 0.0, 0.0],
            [1e308, 1.0, 30.0, 1.0, 1.0, 3.0],
        ];
        let forest = IsolationForest::fit(&data, small_config()).unwrap();
        let score = forest.score_samples(&data[1]).unwrap();
        assert!(score.is_finite() && score < 0.0);

        // only the overflowing column varies, so every tree is a single leaf
        let data = vec![
            [f64::MAX, 1.0, 25.0, 0.0, 0.0, 0.0],
            [f64::MIN, 1.0, 25.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 25.0, 0.0, 0.0, 0.0],
        ];
        let forest = IsolationForest::fit(&data, small_config()).unwrap();
        assert!(forest.trees.iter().all(|tree| tree.nodes.len() == 1));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fraud_iforest.json");
        let forest = IsolationForest::fit(&cluster(80, 5), small_config()).unwrap();
        forest.save(&path).unwrap();

        let (loaded, metadata) = IsolationForest::load(&path).unwrap();
        let applicant = FeatureVector::from_values([33.0, 0.0, 29.0, 2.0, 1.0, 2.0]);
        assert_eq!(
            loaded.decision_function(&applicant).unwrap(),
            forest.decision_function(&applicant).unwrap()
        );
        assert_eq!(metadata.model_type, "isolation-forest");
    }

    #[test]
    fn test_load_rejects_foreign_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.json");
        let mut forest = IsolationForest::fit(&cluster(40, 9), small_config()).unwrap();
        forest.layout.hash = forest.layout.hash.wrapping_add(1);
        forest.save(&path).unwrap();

        let err = IsolationForest::load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Layout { .. }));
    }
}
