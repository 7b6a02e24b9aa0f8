//! Features Module - Applicant Feature Encoding
//!
//! Layout, categorical encoding and the form normalizer. The trainer and the
//! request path both build vectors through this module only.

pub mod encoding;
pub mod layout;
pub mod normalizer;
pub mod vector;

// Re-export common types
pub use encoding::{Categorical, Region, Sex, Smoker, ENCODING_VERSION};
pub use layout::{
    display_label, feature_index, feature_name, layout_hash, validate_layout, LayoutInfo,
    LayoutMismatchError, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION,
};
pub use normalizer::{normalize, normalize_form, RawApplicant, ValidationError, REQUIRED_FIELDS};
pub use vector::{FeatureVector, FeatureVectorBuilder};
