//! Configuration module

use std::env;
use std::path::PathBuf;

use premium_core::constants::{
    DEFAULT_BACKGROUND_PATH, DEFAULT_CURRENCY_SYMBOL, DEFAULT_FRAUD_MODEL_PATH,
    DEFAULT_PREMIUM_MODEL_PATH, DEFAULT_TOP_K,
};
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Validate)]
pub struct Config {
    /// Bind address
    #[validate(length(min = 1))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1))]
    pub port: u16,

    /// Regression model (ONNX), required
    pub premium_model_path: PathBuf,

    /// Isolation forest (JSON), optional
    pub fraud_model_path: PathBuf,

    /// Explainer background (JSON), optional
    pub background_path: PathBuf,

    /// Prefix for rendered amounts
    #[validate(length(min = 1, max = 8))]
    pub currency_symbol: String,

    /// Factors shown in the explanation panel
    #[validate(range(min = 1, max = 6))]
    pub top_k: usize,

    /// Environment (development, production)
    pub environment: String,

    /// `json` for structured logs, anything else for plain text
    pub log_format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            premium_model_path: env::var("PREMIUM_MODEL_PATH")
                .unwrap_or_else(|_| DEFAULT_PREMIUM_MODEL_PATH.to_string())
                .into(),

            fraud_model_path: env::var("FRAUD_MODEL_PATH")
                .unwrap_or_else(|_| DEFAULT_FRAUD_MODEL_PATH.to_string())
                .into(),

            background_path: env::var("EXPLAINER_BACKGROUND_PATH")
                .unwrap_or_else(|_| DEFAULT_BACKGROUND_PATH.to_string())
                .into(),

            currency_symbol: env::var("CURRENCY_SYMBOL")
                .unwrap_or_else(|_| DEFAULT_CURRENCY_SYMBOL.to_string()),

            top_k: env::var("TOP_K_FACTORS")
                .ok()
                .and_then(|k| k.parse().ok())
                .unwrap_or(DEFAULT_TOP_K),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            premium_model_path: DEFAULT_PREMIUM_MODEL_PATH.into(),
            fraud_model_path: DEFAULT_FRAUD_MODEL_PATH.into(),
            background_path: DEFAULT_BACKGROUND_PATH.into(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            top_k: DEFAULT_TOP_K,
            environment: "development".to_string(),
            log_format: "plain".to_string(),
        }
    }
}
