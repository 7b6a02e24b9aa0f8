//! BMI calculator
//!
//! BMI = weight (kg) / (height (m))², rounded to 2 decimals. Classification
//! runs on the rounded value. The bands are contiguous so that every finite
//! value gets a category:
//!
//! ```text
//!   < 18.5          Underweight
//!   [18.5, 24.9)    Normal weight
//!   [24.9, 29.9)    Overweight
//!   >= 29.9         Obese
//! ```

use serde::{Deserialize, Serialize};

use super::presenter::round_to;

/// Display state for unparseable or impossible measurements
pub const INVALID_INPUT: &str = "Invalid input";

const BMI_DECIMALS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    NormalWeight,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::NormalWeight => "Normal weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiReading {
    pub value: f64,
    pub category: BmiCategory,
}

/// Result of one calculator submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BmiOutcome {
    Reading(BmiReading),
    Invalid,
}

impl BmiOutcome {
    pub fn reading(&self) -> Option<&BmiReading> {
        match self {
            Self::Reading(reading) => Some(reading),
            Self::Invalid => None,
        }
    }

    /// Value as displayed: "22.86" or "Invalid input"
    pub fn display_value(&self) -> String {
        match self {
            Self::Reading(reading) => format!("{:.2}", reading.value),
            Self::Invalid => INVALID_INPUT.to_string(),
        }
    }
}

pub fn classify(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 24.9 {
        BmiCategory::NormalWeight
    } else if bmi < 29.9 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Rounded BMI, or `None` for non-positive or non-finite input
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    let measurable = |v: f64| v.is_finite() && v > 0.0;
    if !(measurable(weight_kg) && measurable(height_cm)) {
        return None;
    }
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    bmi.is_finite().then(|| round_to(bmi, BMI_DECIMALS))
}

pub fn calculate(weight_kg: f64, height_cm: f64) -> BmiOutcome {
    match compute_bmi(weight_kg, height_cm) {
        Some(value) => BmiOutcome::Reading(BmiReading {
            value,
            category: classify(value),
        }),
        None => BmiOutcome::Invalid,
    }
}

/// Parse raw form text and calculate
pub fn calculate_from_input(weight: &str, height: &str) -> BmiOutcome {
    let parse = |s: &str| s.trim().parse::<f64>().ok();
    match (parse(weight), parse(height)) {
        (Some(weight), Some(height)) => calculate(weight, height),
        _ => {
            log::debug!("Rejected BMI input: weight={:?} height={:?}", weight, height);
            BmiOutcome::Invalid
        }
    }
}
