//! Explain Module - Feature Attribution
//!
//! - `shapley` computes per-feature contributions for one prediction
//! - `engine` ranks and formats the strongest ones for display

pub mod engine;
pub mod shapley;
pub mod types;

pub use engine::{check_attribution, top_factors, top_indices};
pub use shapley::{BaselineShapleyExplainer, FeatureBackground};
pub use types::{Attribution, TopFactor};
