//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the model input schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The regression model was trained on exactly this column order. Reordering
//! does not fail loudly at inference time, it silently corrupts predictions,
//! which is why every persisted artifact records the layout hash.

use std::sync::OnceLock;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::encoding::{vocabularies, ENCODING_VERSION};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    "age",         // 0: Applicant age in years
    "sex_code",    // 1: 1 = male, 0 = female
    "bmi",         // 2: Body mass index
    "children",    // 3: Number of dependent children
    "smoker_code", // 4: 1 = smoker, 0 = non-smoker
    "region_code", // 5: 0..3, see encoding::Region
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 6;

/// Display labels for the explanation panel
const DISPLAY_LABELS: &[(&str, &str)] = &[
    ("age", "Age"),
    ("sex_code", "Sex"),
    ("bmi", "BMI"),
    ("children", "No. of children"),
    ("smoker_code", "Smoking status"),
    ("region_code", "Region"),
];

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout and categorical encoding
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION, ENCODING_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    for (field, vocabulary) in vocabularies() {
        hasher.update(field.as_bytes());
        hasher.update(&[0]);
        for (label, code) in vocabulary {
            hasher.update(label.as_bytes());
            hasher.update(&[0, *code]);
        }
    }

    hasher.finalize()
}

/// Layout hash, computed once per process
pub fn layout_hash() -> u32 {
    static HASH: OnceLock<u32> = OnceLock::new();
    *HASH.get_or_init(compute_layout_hash)
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information, embedded in every persisted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub encoding_version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            encoding_version: ENCODING_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Check this (deserialized) layout against the running binary
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.hash)
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), \
     got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

/// Display label for a feature, falling back to the raw name
pub fn display_label(name: &str) -> &str {
    DISPLAY_LABELS
        .iter()
        .find(|(feature, _)| *feature == name)
        .map(|(_, label)| *label)
        .unwrap_or(name)
}

// ============================================================================
// TESTS
// ============================================================================
