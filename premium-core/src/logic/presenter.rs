//! Result Presenter
//!
//! Pure formatting of pipeline output into display strings. No business
//! rules live here beyond choosing which message to show.

use serde::Serialize;

use super::explain::TopFactor;
use super::pipeline::{PredictError, PredictionResult, PremiumEstimate};
use crate::constants::{
    ANOMALY_ADVISORY, ANOMALY_SCORE_DECIMALS, DEFAULT_CURRENCY_SYMBOL, ERROR_AMOUNT_TEXT,
    NO_AMOUNT_TEXT, PREMIUM_DECIMALS,
};

/// Minus sign used for negative factor amounts (U+2212)
pub const MINUS_SIGN: char = '\u{2212}';

// ============================================================================
// CURRENCY FORMATTING
// ============================================================================

/// `symbol` + amount with thousands separators, rounded to `decimals`
pub fn format_currency(value: f64, decimals: usize, symbol: &str) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match rendered.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (rendered.as_str(), None),
    };
    // "-0.000" reads as zero, not as a negative amount
    let is_negative = value < 0.0 && rendered.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let sign = if is_negative { "-" } else { "" };

    match fraction {
        Some(fraction) => format!("{sign}{symbol}{}.{fraction}", group_thousands(whole)),
        None => format!("{sign}{symbol}{}", group_thousands(whole)),
    }
}

/// Whole-unit magnitude with an explicit sign: `+₹1,234` / `−₹567`
pub fn signed_amount(value: f64, symbol: &str) -> String {
    let sign = if value >= 0.0 { '+' } else { MINUS_SIGN };
    format!("{sign}{}", format_currency(value.abs(), 0, symbol))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ============================================================================
// PRESENTED VIEW
// ============================================================================

/// Display-ready strings for the result view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentedResult {
    pub premium_text: String,
    pub error_message: Option<String>,
    pub anomaly_message: Option<String>,
    pub anomaly_score: Option<String>,
    pub top_factors: Vec<TopFactor>,
    pub base_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Presenter {
    currency_symbol: String,
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_SYMBOL)
    }
}

impl Presenter {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn premium_text(&self, estimate: PremiumEstimate) -> String {
        match estimate {
            PremiumEstimate::Valid(value) => format!(
                "Expected amount is {}",
                format_currency(value, PREMIUM_DECIMALS, &self.currency_symbol)
            ),
            PremiumEstimate::Degenerate(_) => ERROR_AMOUNT_TEXT.to_string(),
        }
    }

    pub fn present(&self, result: &PredictionResult) -> PresentedResult {
        PresentedResult {
            premium_text: self.premium_text(result.premium_estimate),
            error_message: None,
            anomaly_message: result.anomaly_flag.then(|| ANOMALY_ADVISORY.to_string()),
            anomaly_score: result
                .anomaly_score
                .map(|score| format!("{:.*}", ANOMALY_SCORE_DECIMALS as usize, score)),
            top_factors: result.top_factors.clone(),
            base_value: result
                .base_value
                .map(|base| format_currency(base, PREMIUM_DECIMALS, &self.currency_symbol)),
        }
    }

    /// Error banner view; nothing else is shown
    pub fn present_error(&self, message: impl Into<String>) -> PresentedResult {
        PresentedResult {
            premium_text: NO_AMOUNT_TEXT.to_string(),
            error_message: Some(message.into()),
            anomaly_message: None,
            anomaly_score: None,
            top_factors: Vec::new(),
            base_value: None,
        }
    }

    pub fn present_outcome(&self, outcome: &Result<PredictionResult, PredictError>) -> PresentedResult {
        match outcome {
            Ok(result) => self.present(result),
            Err(err) => self.present_error(err.user_message()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
