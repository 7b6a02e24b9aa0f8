//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use premium_core::logic::features::ValidationError;
use premium_core::{PipelineError, PredictError};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Request errors
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("{0}")]
    InvalidInput(String),

    // Model errors
    #[error("{0}")]
    Inference(String),

    // Generic errors
    #[error("{0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation { message, .. } => (StatusCode::BAD_REQUEST, message.as_str()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Inference(msg) => {
                tracing::error!("Inference error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str())
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16()
        });
        if let AppError::Validation { fields, .. } = &self {
            body["fields"] = json!(fields);
        }

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            fields: err.fields(),
            message: err.to_string(),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Inference(PredictError::from(err).user_message())
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Validation(err) => err.into(),
            PredictError::Pipeline(err) => err.into(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("inference worker failed: {err}"))
    }
}
