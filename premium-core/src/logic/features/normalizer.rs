//! Input Normalizer
//!
//! Turns loosely-typed form fields into a `FeatureVector`. Checks run in a
//! fixed order: every missing field is reported at once, then the numeric
//! fields (age, bmi, children), then the categorical ones (sex, smoker,
//! region). The first numeric or categorical failure wins.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::encoding::{Categorical, Region, Sex, Smoker};
use super::vector::{FeatureVector, FeatureVectorBuilder};

/// Required form fields, in reporting order
pub const REQUIRED_FIELDS: [&str; 6] = ["age", "sex", "bmi", "children", "smoker", "region"];

/// Hint shown when a numeric field does not parse
pub const NUMERIC_HINT: &str = "Age, BMI, and Children must be numeric values (e.g., 30, 24.5, 2).";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill all required fields: {}.", .fields.join(", "))]
    MissingField { fields: Vec<&'static str> },

    #[error("Invalid value for {field}: {value:?}. Age, BMI, and Children must be numeric values (e.g., 30, 24.5, 2).")]
    NumericParse { field: &'static str, value: String },

    #[error("Invalid value for {field}: {value:?}. Use one of: {accepted}.")]
    InvalidCategory {
        field: &'static str,
        value: String,
        accepted: String,
    },
}

impl ValidationError {
    /// Field(s) the error refers to
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            Self::MissingField { fields } => fields.clone(),
            Self::NumericParse { field, .. } | Self::InvalidCategory { field, .. } => vec![*field],
        }
    }
}

// ============================================================================
// RAW INPUT
// ============================================================================

/// Raw applicant fields as submitted (form or JSON)
///
/// JSON callers may send numbers or booleans; they are kept as their textual
/// form so both surfaces share one validation path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawApplicant {
    #[serde(default, deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bmi: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub children: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub smoker: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub region: Option<String>,
}

impl RawApplicant {
    /// Build from a submitted form map; unknown keys are ignored
    pub fn from_map(form: &HashMap<String, String>) -> Self {
        let take = |name: &str| form.get(name).cloned();
        Self {
            age: take("age"),
            sex: take("sex"),
            bmi: take("bmi"),
            children: take("children"),
            smoker: take("smoker"),
            region: take("region"),
        }
    }

    /// Trimmed values paired with their field name, in REQUIRED_FIELDS order
    fn trimmed(&self) -> [(&'static str, &str); 6] {
        fn value(v: &Option<String>) -> &str {
            v.as_deref().map(str::trim).unwrap_or("")
        }
        [
            ("age", value(&self.age)),
            ("sex", value(&self.sex)),
            ("bmi", value(&self.bmi)),
            ("children", value(&self.children)),
            ("smoker", value(&self.smoker)),
            ("region", value(&self.region)),
        ]
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Validate and encode raw applicant fields into a feature vector
pub fn normalize(raw: &RawApplicant) -> Result<FeatureVector, ValidationError> {
    let fields = raw.trimmed();

    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingField { fields: missing });
    }

    let [(_, age), (_, sex), (_, bmi), (_, children), (_, smoker), (_, region)] = fields;

    let age = parse_numeric("age", age)?;
    let bmi = parse_numeric("bmi", bmi)?;
    let children = parse_numeric("children", children)?;

    let sex = parse_category::<Sex>(sex)?;
    let smoker = parse_category::<Smoker>(smoker)?;
    let region = parse_category::<Region>(region)?;

    Ok(FeatureVectorBuilder::new()
        .age(age)
        .sex(sex)
        .bmi(bmi)
        .children(children)
        .smoker(smoker)
        .region(region)
        .build())
}

/// Convenience wrapper for an urlencoded form map
pub fn normalize_form(form: &HashMap<String, String>) -> Result<FeatureVector, ValidationError> {
    normalize(&RawApplicant::from_map(form))
}

fn parse_numeric(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::NumericParse {
            field,
            value: value.to_string(),
        })
}

fn parse_category<C: Categorical>(value: &str) -> Result<C, ValidationError> {
    C::parse(value).ok_or_else(|| ValidationError::InvalidCategory {
        field: C::FIELD,
        value: value.to_string(),
        accepted: C::accepted(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
