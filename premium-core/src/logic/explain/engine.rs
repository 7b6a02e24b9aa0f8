use super::types::{Attribution, TopFactor};
use crate::logic::features::{display_label, feature_name, FEATURE_COUNT};
use crate::logic::presenter::signed_amount;

/// Check an explainer answer before it is ranked
pub fn check_attribution(attribution: &Attribution) -> Result<(), String> {
    if attribution.contributions.len() != FEATURE_COUNT {
        return Err(format!(
            "expected {} contributions, got {}",
            FEATURE_COUNT,
            attribution.contributions.len()
        ));
    }
    if attribution.contributions.iter().any(|c| !c.is_finite()) {
        return Err("non-finite contribution".to_string());
    }
    if !attribution.base_value.is_finite() {
        return Err("non-finite base value".to_string());
    }
    Ok(())
}

/// Indices of the `k` largest contributions by magnitude.
/// Equal magnitudes keep their layout order (stable sort).
pub fn top_indices(contributions: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..contributions.len()).collect();
    indices.sort_by(|&a, &b| contributions[b].abs().total_cmp(&contributions[a].abs()));
    indices.truncate(k);
    indices
}

/// Rank and format the strongest contributions
pub fn top_factors(attribution: &Attribution, k: usize, currency_symbol: &str) -> Vec<TopFactor> {
    top_indices(&attribution.contributions, k)
        .into_iter()
        .map(|i| {
            let raw = attribution.contributions[i];
            let feature = feature_name(i).map(str::to_string).unwrap_or_else(|| format!("feature_{i}"));
            TopFactor {
                name: display_label(&feature).to_string(),
                signed_amount: signed_amount(raw, currency_symbol),
                raw,
                feature,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribution(contributions: Vec<f64>) -> Attribution {
        Attribution {
            contributions,
            base_value: 13_270.0,
        }
    }

    #[test]
    fn test_top_three_by_magnitude() {
        let contributions = [0.2, -0.9, 0.05, 0.4, -0.1, 0.01];
        let picked: Vec<f64> = top_indices(&contributions, 3)
            .into_iter()
            .map(|i| contributions[i])
            .collect();
        assert_eq!(picked, vec![-0.9, 0.4, 0.2]);
    }

    #[test]
    fn test_ties_keep_layout_order() {
        assert_eq!(top_indices(&[0.5, -0.5, 0.1, 0.5, 0.0, 0.0], 3), vec![0, 1, 3]);
    }

    #[test]
    fn test_k_larger_than_features() {
        assert_eq!(top_indices(&[1.0, 2.0], 3), vec![1, 0]);
    }

    #[test]
    fn test_top_factors_labels_and_amounts() {
        let factors = top_factors(
            &attribution(vec![3_100.0, -120.0, 1_850.4, 40.0, 23_412.7, -600.0]),
            3,
            "₹",
        );

        let names: Vec<&str> = factors.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Smoking status", "Age", "BMI"]);
        assert_eq!(factors[0].feature, "smoker_code");
        assert_eq!(factors[0].signed_amount, "+₹23,413");
        assert_eq!(factors[2].signed_amount, "+₹1,850");
        assert_eq!(factors[0].raw, 23_412.7);
    }

    #[test]
    fn test_negative_factor_uses_minus_sign() {
        let factors = top_factors(&attribution(vec![0.0, -4_200.0, 0.0, 0.0, 0.0, 0.0]), 1, "$");
        assert_eq!(factors[0].name, "Sex");
        assert_eq!(factors[0].signed_amount, "\u{2212}$4,200");
    }

    #[test]
    fn test_check_attribution() {
        assert!(check_attribution(&attribution(vec![0.0; FEATURE_COUNT])).is_ok());
        assert!(check_attribution(&attribution(vec![0.0; 4])).is_err());
        assert!(check_attribution(&attribution(vec![0.0, f64::NAN, 0.0, 0.0, 0.0, 0.0])).is_err());

        let mut bad_base = attribution(vec![0.0; FEATURE_COUNT]);
        bad_base.base_value = f64::INFINITY;
        assert!(check_attribution(&bad_base).is_err());
    }
}
