use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use premium_core::logic::explain::Attribution;
use premium_core::logic::model::{ModelMetadata, ANOMALY_SENTINEL};
use premium_core::testing::{FailingAnomaly, FailingRegressor, FixedAnomaly, FixedExplainer, FixedRegressor};
use premium_core::{PredictionPipeline, Presenter};
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::models::{ArtifactStatus, ModelStatus};
use crate::{create_router, AppState};

const VALID_FORM: &str = "age=30&sex=male&bmi=24.5&children=2&smoker=no&region=southeast";

fn loaded() -> ArtifactStatus {
    ArtifactStatus::Loaded {
        metadata: ModelMetadata::new(std::path::Path::new("memory"), "test", b""),
    }
}

fn app(pipeline: PredictionPipeline) -> Router {
    create_router(AppState {
        pipeline: Arc::new(pipeline),
        presenter: Arc::new(Presenter::default()),
        models: Arc::new(ModelStatus {
            regressor: loaded(),
            anomaly: loaded(),
            explainer: ArtifactStatus::Missing {
                path: "models/feature_background.json".to_string(),
            },
        }),
        config: Config::default(),
    })
}

fn full_pipeline(premium: f64) -> PredictionPipeline {
    PredictionPipeline::new(Arc::new(FixedRegressor::new(premium)))
        .with_anomaly(Arc::new(FixedAnomaly::new(0.0456, 1)))
        .with_explainer(Arc::new(FixedExplainer::new(Attribution {
            contributions: vec![3_100.0, -120.0, 1_850.4, 40.0, 23_412.7, -600.0],
            base_value: 13_270.422,
        })))
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn text(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn json(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = text(router, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

// ============================================================================
// HTML
// ============================================================================

#[tokio::test]
async fn test_static_pages() {
    for (uri, marker) in [
        ("/", "action=\"/predict\""),
        ("/about", "<h1>About</h1>"),
        ("/howitworks", "<h1>How it works</h1>"),
        ("/contact", "<h1>Contact</h1>"),
        ("/bmi", "action=\"/bmi\""),
    ] {
        let (status, body) = text(app(full_pipeline(1.0)), get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.contains(marker), "{uri}");
    }
}

#[tokio::test]
async fn test_form_prediction_renders_result() {
    let (status, body) = text(app(full_pipeline(4_512.3)), form_post("/predict", VALID_FORM)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Expected amount is ₹4,512.300"));
    assert!(body.contains("Smoking status <strong>+₹23,413</strong>"));
    assert!(body.contains("Age <strong>+₹3,100</strong>"));
    assert!(body.contains("BMI <strong>+₹1,850</strong>"));
    assert!(!body.contains("Unusual input pattern"));
}

#[tokio::test]
async fn test_form_missing_fields_banner() {
    let (status, body) = text(app(full_pipeline(1.0)), form_post("/predict", "age=30&sex=&bmi=24")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Please fill all required fields: sex, children, smoker, region."));
    assert!(body.contains("—"));
}

#[tokio::test]
async fn test_form_negative_premium() {
    let (_, body) = text(app(full_pipeline(-150.0)), form_post("/predict", VALID_FORM)).await;
    assert!(body.contains("Error calculating Amount!"));
}

#[tokio::test]
async fn test_form_flagged_input_shows_advisory() {
    let pipeline = PredictionPipeline::new(Arc::new(FixedRegressor::new(60_000.0)))
        .with_anomaly(Arc::new(FixedAnomaly::new(-0.0871, ANOMALY_SENTINEL)));
    let (_, body) = text(app(pipeline), form_post("/predict", VALID_FORM)).await;
    assert!(body.contains("Unusual input pattern detected."));
    assert!(body.contains("(score -0.087)"));
}

#[tokio::test]
async fn test_form_regression_failure_banner() {
    let pipeline = PredictionPipeline::new(Arc::new(FailingRegressor::new("session closed")));
    let (status, body) = text(app(pipeline), form_post("/predict", VALID_FORM)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Model error: inference failed: session closed"));
}

#[tokio::test]
async fn test_form_bmi() {
    let (_, body) = text(app(full_pipeline(1.0)), form_post("/bmi", "weight=70&height=175")).await;
    assert!(body.contains("<strong>22.86</strong> (Normal weight)"));

    let (_, body) = text(app(full_pipeline(1.0)), form_post("/bmi", "weight=heavy&height=175")).await;
    assert!(body.contains("Invalid input"));
}

// ============================================================================
// JSON
// ============================================================================

#[tokio::test]
async fn test_health_reports_layout_and_models() {
    let (status, body) = json(app(full_pipeline(1.0)), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["layout"]["hash"], premium_core::logic::features::layout_hash());
    assert_eq!(body["models"]["regressor"]["state"], "loaded");
    assert_eq!(body["models"]["explainer"]["state"], "missing");
}

#[tokio::test]
async fn test_api_predict_success() {
    let payload = serde_json::json!({
        "age": 30, "sex": "male", "bmi": 24.5, "children": 2, "smoker": false, "region": 2
    });
    let (status, body) = json(app(full_pipeline(4_512.3)), json_post("/api/v1/predict", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["premium_estimate"]["kind"], "valid");
    assert_eq!(body["result"]["anomaly_score"], 0.046);
    assert_eq!(body["result"]["top_factors"].as_array().unwrap().len(), 3);
    assert_eq!(body["presented"]["premium_text"], "Expected amount is ₹4,512.300");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_api_predict_validation_error() {
    let payload = serde_json::json!({
        "age": "thirty", "sex": "male", "bmi": 24.5, "children": 2, "smoker": "no", "region": "southeast"
    });
    let (status, body) = json(app(full_pipeline(1.0)), json_post("/api/v1/predict", payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["fields"], serde_json::json!(["age"]));
}

#[tokio::test]
async fn test_api_predict_inference_error() {
    let pipeline = PredictionPipeline::new(Arc::new(FailingRegressor::new("bad tensor")))
        .with_anomaly(Arc::new(FailingAnomaly::new("also broken")));
    let payload = serde_json::json!({
        "age": 30, "sex": "f", "bmi": 31, "children": 0, "smoker": "yes", "region": "northwest"
    });
    let (status, body) = json(app(pipeline), json_post("/api/v1/predict", payload)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Model error: inference failed: bad tensor");
}

#[tokio::test]
async fn test_api_bmi() {
    let (status, body) = json(
        app(full_pipeline(1.0)),
        json_post("/api/v1/bmi", serde_json::json!({"weight": 78.0, "height": 176.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bmi"], 25.04);
    assert_eq!(body["label"], "Overweight");

    let (status, body) = json(
        app(full_pipeline(1.0)),
        json_post("/api/v1/bmi", serde_json::json!({"weight": 70.0, "height": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input");
}

#[test]
fn test_router_builds_without_runtime() {
    tokio_test::block_on(async {
        let (status, _) = text(app(full_pipeline(1.0)), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
    });
}
