//! Premium prediction handlers
//!
//! `POST /predict` serves the HTML form and always answers 200 with either a
//! result or an error banner. `POST /api/v1/predict` is the JSON flavour and
//! uses status codes instead.

use std::collections::HashMap;

use axum::{extract::State, response::Html, Form, Json};
use premium_core::logic::features::RawApplicant;
use premium_core::{PredictError, PredictionResult, PresentedResult};
use serde::Serialize;
use uuid::Uuid;

use crate::{views, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub request_id: Uuid,
    pub result: PredictionResult,
    pub presented: PresentedResult,
}

/// Run the pipeline off the async executor; inference is CPU-bound
async fn score(
    state: &AppState,
    raw: RawApplicant,
) -> Result<Result<PredictionResult, PredictError>, tokio::task::JoinError> {
    let pipeline = state.pipeline.clone();
    tokio::task::spawn_blocking(move || pipeline.predict_raw(&raw)).await
}

fn log_outcome(request_id: Uuid, outcome: &Result<PredictionResult, PredictError>) {
    match outcome {
        Ok(result) => tracing::info!(
            %request_id,
            premium = result.premium_estimate.value(),
            anomaly = result.anomaly_flag,
            degraded = result.is_degraded(),
            "Prediction served"
        ),
        Err(PredictError::Validation(err)) => {
            tracing::debug!(%request_id, fields = ?err.fields(), "Rejected input: {}", err)
        }
        Err(PredictError::Pipeline(err)) => tracing::error!(%request_id, "Prediction failed: {}", err),
    }
}

pub async fn form(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String> {
    let request_id = Uuid::new_v4();
    let view = match score(&state, RawApplicant::from_map(&fields)).await {
        Ok(outcome) => {
            log_outcome(request_id, &outcome);
            state.presenter.present_outcome(&outcome)
        }
        Err(e) => {
            tracing::error!(%request_id, "Inference worker failed: {}", e);
            state.presenter.present_error(format!("Model error: {e}"))
        }
    };
    Html(views::prediction(&view))
}

pub async fn api(
    State(state): State<AppState>,
    Json(raw): Json<RawApplicant>,
) -> AppResult<Json<PredictResponse>> {
    let request_id = Uuid::new_v4();
    let outcome = score(&state, raw).await?;
    log_outcome(request_id, &outcome);

    let result = outcome?;
    Ok(Json(PredictResponse {
        request_id,
        presented: state.presenter.present(&result),
        result,
    }))
}
