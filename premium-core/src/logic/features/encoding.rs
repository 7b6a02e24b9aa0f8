//! Categorical Encoding - Shared Vocabulary
//!
//! **Both the request normalizer and the offline trainer encode through this
//! module.** The vocabularies below are folded into the layout hash
//! (`layout.rs`), so editing a synonym or a code changes the hash and any
//! artifact trained against the old encoding is refused at load time.
//!
//! ## Rules:
//! 1. Change a code → increment ENCODING_VERSION
//! 2. Add or remove a synonym → increment ENCODING_VERSION

use serde::{Deserialize, Serialize};

/// Current encoding version, hashed together with the feature layout
pub const ENCODING_VERSION: u8 = 1;

// ============================================================================
// CATEGORICAL TRAIT
// ============================================================================

/// A categorical applicant attribute with a fixed label vocabulary
pub trait Categorical: Sized + Copy {
    /// Form field name (`sex`, `smoker`, `region`)
    const FIELD: &'static str;

    /// Accepted lower-case labels and the code each one maps to
    const VOCABULARY: &'static [(&'static str, u8)];

    /// Largest valid numeric code
    const MAX_CODE: u8;

    fn from_code(code: u8) -> Option<Self>;

    fn code(self) -> u8;

    /// Look up a label (case-insensitive, trimmed)
    fn from_label(label: &str) -> Option<Self> {
        let needle = label.trim().to_ascii_lowercase();
        Self::VOCABULARY
            .iter()
            .find(|(name, _)| *name == needle)
            .and_then(|(_, code)| Self::from_code(*code))
    }

    /// Parse either a canonical code already in range or a vocabulary label.
    /// A code is passed through as-is, never re-mapped.
    fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed.parse::<u8>().ok().and_then(Self::from_code);
        }
        Self::from_label(trimmed)
    }

    /// Human-readable list of accepted values for error messages
    fn accepted() -> String {
        let labels: Vec<&str> = Self::VOCABULARY.iter().map(|(name, _)| *name).collect();
        format!("{} (or code 0-{})", labels.join(", "), Self::MAX_CODE)
    }
}

// ============================================================================
// SEX
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

impl Categorical for Sex {
    const FIELD: &'static str = "sex";
    const VOCABULARY: &'static [(&'static str, u8)] = &[
        ("male", 1),
        ("m", 1),
        ("female", 0),
        ("f", 0),
    ];
    const MAX_CODE: u8 = 1;

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Female),
            1 => Some(Self::Male),
            _ => None,
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
        }
    }
}

// ============================================================================
// SMOKER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoker {
    No,
    Yes,
}

impl Categorical for Smoker {
    const FIELD: &'static str = "smoker";
    const VOCABULARY: &'static [(&'static str, u8)] = &[
        ("yes", 1),
        ("y", 1),
        ("true", 1),
        ("no", 0),
        ("n", 0),
        ("false", 0),
    ];
    const MAX_CODE: u8 = 1;

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::No),
            1 => Some(Self::Yes),
            _ => None,
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::No => 0,
            Self::Yes => 1,
        }
    }
}

// ============================================================================
// REGION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Categorical for Region {
    const FIELD: &'static str = "region";
    const VOCABULARY: &'static [(&'static str, u8)] = &[
        ("northeast", 0),
        ("northwest", 1),
        ("southeast", 2),
        ("southwest", 3),
    ];
    const MAX_CODE: u8 = 3;

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Northeast),
            1 => Some(Self::Northwest),
            2 => Some(Self::Southeast),
            3 => Some(Self::Southwest),
            _ => None,
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::Northeast => 0,
            Self::Northwest => 1,
            Self::Southeast => 2,
            Self::Southwest => 3,
        }
    }
}

// ============================================================================
// VOCABULARY TABLE
// ============================================================================

/// All categorical vocabularies in a fixed order, used for layout hashing
pub fn vocabularies() -> [(&'static str, &'static [(&'static str, u8)]); 3] {
    [
        (Sex::FIELD, Sex::VOCABULARY),
        (Smoker::FIELD, Smoker::VOCABULARY),
        (Region::FIELD, Region::VOCABULARY),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_case_and_space_insensitive() {
        assert_eq!(Sex::parse("Male"), Some(Sex::Male));
        assert_eq!(Sex::parse(" male "), Some(Sex::Male));
        assert_eq!(Sex::parse("MALE"), Some(Sex::Male));
        assert_eq!(Sex::parse("f"), Some(Sex::Female));
        assert_eq!(Smoker::parse(" TRUE"), Some(Smoker::Yes));
        assert_eq!(Smoker::parse("n"), Some(Smoker::No));
        assert_eq!(Region::parse("SouthWest "), Some(Region::Southwest));
    }

    #[test]
    fn test_codes_pass_through() {
        assert_eq!(Region::parse("2").map(Region::code), Some(2));
        assert_eq!(Sex::parse("0"), Some(Sex::Female));
        assert_eq!(Smoker::parse("1"), Some(Smoker::Yes));
    }

    #[test]
    fn test_out_of_range_codes_rejected() {
        assert_eq!(Sex::parse("2"), None);
        assert_eq!(Region::parse("4"), None);
        assert_eq!(Region::parse("300"), None);
        assert_eq!(Smoker::parse("-1"), None);
    }

    #[test]
    fn test_unknown_labels_rejected() {
        assert_eq!(Sex::parse("other"), None);
        assert_eq!(Smoker::parse("sometimes"), None);
        assert_eq!(Region::parse("north"), None);
        assert_eq!(Region::parse(""), None);
    }

    #[test]
    fn test_vocabulary_codes_round_trip() {
        for (label, code) in Region::VOCABULARY {
            let region = Region::from_label(label).unwrap();
            assert_eq!(region.code(), *code);
            assert_eq!(Region::from_code(*code), Some(region));
        }
    }

    #[test]
    fn test_accepted_lists_every_label() {
        let accepted = Smoker::accepted();
        for (label, _) in Smoker::VOCABULARY {
            assert!(accepted.contains(label));
        }
        assert!(accepted.ends_with("(or code 0-1)"));
    }
}
