//! Health check handler

use axum::{extract::State, Json};
use premium_core::constants::APP_VERSION;
use premium_core::logic::features::LayoutInfo;
use serde::Serialize;

use crate::models::ModelStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    environment: String,
    layout: LayoutInfo,
    models: ModelStatus,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let models = state.models.as_ref().clone();
    Json(HealthResponse {
        status: if models.is_degraded() { "degraded" } else { "healthy" },
        version: APP_VERSION,
        timestamp: chrono::Utc::now().timestamp(),
        environment: state.config.environment.clone(),
        layout: LayoutInfo::current(),
        models,
    })
}
