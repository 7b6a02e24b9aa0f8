//! Logic Module - Estimation Engines
//!
//! ## Architecture
//! - `features/` - Layout, categorical encoding, form normalizer
//! - `model/` - Oracle traits, ONNX regressor, isolation forest
//! - `explain/` - Shapley attribution and top-factor ranking
//! - `pipeline` - anomaly → regression → explanation
//! - `presenter` - display strings
//! - `bmi` - BMI calculator
//! - `training/` - offline anomaly model fitting

pub mod bmi;
pub mod explain;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod presenter;
pub mod training;
