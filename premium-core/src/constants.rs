//! Central Configuration Constants
//!
//! Single source of truth for defaults shared by the server and the trainer.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Premium Estimator";

/// Number of factors shown in the explanation panel
pub const DEFAULT_TOP_K: usize = 3;

/// Currency prefix for amounts
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Decimal places for the premium and base value
pub const PREMIUM_DECIMALS: usize = 3;

/// Decimal places for the anomaly score
pub const ANOMALY_SCORE_DECIMALS: i32 = 3;

/// Shown instead of a premium when the model returns a negative value
pub const ERROR_AMOUNT_TEXT: &str = "Error calculating Amount!";

/// Shown in the premium slot when the request could not be scored
pub const NO_AMOUNT_TEXT: &str = "—";

/// Advisory shown when the anomaly oracle flags the input
pub const ANOMALY_ADVISORY: &str = "Unusual input pattern detected. Please double-check your details \
     (e.g., age, BMI, smoker/region codes).";

// ============================================
// Default artifact locations
// ============================================

pub const DEFAULT_PREMIUM_MODEL_PATH: &str = "models/premium_regressor.onnx";

pub const DEFAULT_FRAUD_MODEL_PATH: &str = "models/fraud_iforest.json";

pub const DEFAULT_BACKGROUND_PATH: &str = "models/feature_background.json";

pub const DEFAULT_TRAINING_DATA_PATH: &str = "insurance.csv";
