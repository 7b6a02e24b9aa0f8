//! BMI calculator handlers

use std::collections::HashMap;

use axum::{response::Html, Form, Json};
use premium_core::logic::bmi::{calculate, calculate_from_input, BmiCategory, BmiOutcome, INVALID_INPUT};
use serde::{Deserialize, Serialize};

use crate::{views, AppError, AppResult};

pub async fn page() -> Html<String> {
    Html(views::bmi(None))
}

pub async fn form(Form(fields): Form<HashMap<String, String>>) -> Html<String> {
    let field = |name: &str| fields.get(name).map(String::as_str).unwrap_or("");
    let outcome = calculate_from_input(field("weight"), field("height"));
    Html(views::bmi(Some(&outcome)))
}

#[derive(Debug, Deserialize)]
pub struct BmiRequest {
    /// kg
    pub weight: f64,
    /// cm
    pub height: f64,
}

#[derive(Debug, Serialize)]
pub struct BmiReport {
    pub bmi: f64,
    pub category: BmiCategory,
    pub label: &'static str,
}

pub async fn api(Json(req): Json<BmiRequest>) -> AppResult<Json<BmiReport>> {
    match calculate(req.weight, req.height) {
        BmiOutcome::Reading(reading) => Ok(Json(BmiReport {
            bmi: reading.value,
            category: reading.category,
            label: reading.category.label(),
        })),
        BmiOutcome::Invalid => Err(AppError::InvalidInput(INVALID_INPUT.to_string())),
    }
}
