//! Premium Estimator - Core Library
//!
//! Applicant encoding, model oracles, the prediction pipeline and its
//! presenter, the BMI calculator, and the offline anomaly-model trainer.
//! The web server and the `train-fraud-model` binary are thin shells over
//! this crate.

pub mod constants;
pub mod logic;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use logic::pipeline::{
    PipelineError, PipelineOptions, PredictError, PredictionPipeline, PredictionResult,
    PremiumEstimate, StageStatus,
};
pub use logic::presenter::{PresentedResult, Presenter};
