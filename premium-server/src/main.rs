//! Premium Estimator Web Server
//!
//! Serves the premium form, the BMI calculator and a small JSON API on top
//! of `premium-core`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PREMIUM ESTIMATOR                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐ │
//! │  │  Routes   │  │  Normalizer   │  │  Pipeline           │ │
//! │  │  (Axum)   │─►│  (features)   │─►│  anomaly → premium  │ │
//! │  │           │  │               │  │  → explanation      │ │
//! │  └───────────┘  └───────────────┘  └──────────┬──────────┘ │
//! │                                               ▼            │
//! │                                        ┌─────────────┐     │
//! │                                        │  Presenter  │     │
//! │                                        └─────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod models;
mod views;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use premium_core::{PredictionPipeline, Presenter};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    init_tracing(&config);

    config.validate().context("invalid configuration")?;
    tracing::info!("Premium Estimator v{} starting...", premium_core::constants::APP_VERSION);
    tracing::info!(
        "Feature layout v{} (hash {:08x})",
        premium_core::logic::features::FEATURE_VERSION,
        premium_core::logic::features::layout_hash()
    );

    // Load models
    let (pipeline, models) = models::load_pipeline(&config)?;

    // Build application state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        presenter: Arc::new(Presenter::new(config.currency_symbol.clone())),
        models: Arc::new(models),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing(config: &config::Config) {
    let default_filter = if config.is_production() {
        "premium_server=info,premium_core=info,tower_http=info"
    } else {
        "premium_server=debug,premium_core=debug,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let (json, plain) = if config.json_logs() {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PredictionPipeline>,
    pub presenter: Arc<Presenter>,
    pub models: Arc<models::ModelStatus>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // HTML pages
    let pages = Router::new()
        .route("/", get(handlers::pages::home))
        .route("/predict", post(handlers::predict::form))
        .route("/bmi", get(handlers::bmi::page).post(handlers::bmi::form))
        .route("/about", get(handlers::pages::about))
        .route("/howitworks", get(handlers::pages::how_it_works))
        .route("/contact", get(handlers::pages::contact));

    // JSON API
    let api = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/predict", post(handlers::predict::api))
        .route("/api/v1/bmi", post(handlers::bmi::api));

    // Combine all routes
    Router::new()
        .merge(pages)
        .merge(api)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
