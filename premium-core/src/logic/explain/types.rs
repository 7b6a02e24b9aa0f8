use serde::{Deserialize, Serialize};

/// Raw answer of an explainer: one contribution per feature plus the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub contributions: Vec<f64>,
    pub base_value: f64,
}

/// One ranked factor as shown in the explanation panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFactor {
    /// Display label ("Smoking status")
    pub name: String,
    /// Internal feature name ("smoker_code")
    pub feature: String,
    /// Signed currency magnitude ("+₹23,400")
    pub signed_amount: String,
    pub raw: f64,
}
