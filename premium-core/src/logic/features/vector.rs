//! Feature Vector - Core data structure for model input
//!
//! **Versioned feature vector with layout validation**
//!
//! Uses the centralized layout from `layout.rs` for consistent ordering,
//! version tracking and mismatch detection.

use serde::{Deserialize, Serialize};

use super::encoding::{Categorical, Region, Sex, Smoker};
use super::layout::{
    feature_index, layout_hash, validate_layout, LayoutMismatchError, FEATURE_COUNT,
    FEATURE_VERSION,
};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
///
/// Values are always `[age, sex_code, bmi, children, smoker_code, region_code]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout and encoding
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create a new zeroed feature vector with current version
    pub fn new() -> Self {
        Self::from_values([0.0; FEATURE_COUNT])
    }

    /// Create from raw values with current version
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Values narrowed to `f32` for tensor input
    pub fn to_f32(&self) -> [f32; FEATURE_COUNT] {
        self.values.map(|v| v as f32)
    }

    pub fn age(&self) -> f64 {
        self.values[0]
    }

    pub fn sex_code(&self) -> f64 {
        self.values[1]
    }

    pub fn bmi(&self) -> f64 {
        self.values[2]
    }

    pub fn children(&self) -> f64 {
        self.values[3]
    }

    pub fn smoker_code(&self) -> f64 {
        self.values[4]
    }

    pub fn region_code(&self) -> f64 {
        self.values[5]
    }

    /// Validate that this vector is compatible with current layout
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}

// ============================================================================
// BUILDER PATTERN
// ============================================================================

/// Builder for creating FeatureVector with typed setters
pub struct FeatureVectorBuilder {
    vector: FeatureVector,
}

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self { vector: FeatureVector::new() }
    }

    fn put(mut self, name: &str, value: f64) -> Self {
        if let Some(index) = feature_index(name) {
            self.vector.values[index] = value;
        }
        self
    }

    pub fn age(self, value: f64) -> Self {
        self.put("age", value)
    }

    pub fn sex(self, value: Sex) -> Self {
        self.put("sex_code", f64::from(value.code()))
    }

    pub fn bmi(self, value: f64) -> Self {
        self.put("bmi", value)
    }

    pub fn children(self, value: f64) -> Self {
        self.put("children", value)
    }

    pub fn smoker(self, value: Smoker) -> Self {
        self.put("smoker_code", f64::from(value.code()))
    }

    pub fn region(self, value: Region) -> Self {
        self.put("region_code", f64::from(value.code()))
    }

    pub fn build(self) -> FeatureVector {
        self.vector
    }
}

impl Default for FeatureVectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
