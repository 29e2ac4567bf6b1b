//! Confidence tiers for population comparisons.

use serde::{Deserialize, Serialize};

/// How reliable a population's percentile comparisons are,
/// driven purely by sample size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Moderate,
    #[default]
    Low,
}

impl Confidence {
    /// Classify by matching row count: under 100 is low, under 1000
    /// moderate, anything larger high.
    pub fn from_sample_size(n: u64) -> Self {
        if n < 100 {
            Confidence::Low
        } else if n < 1000 {
            Confidence::Moderate
        } else {
            Confidence::High
        }
    }

    /// Whether percentile text should be shown at all.
    pub fn is_reliable(&self) -> bool {
        matches!(self, Confidence::High | Confidence::Moderate)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Moderate => write!(f, "moderate"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(Confidence::from_sample_size(0), Confidence::Low);
        assert_eq!(Confidence::from_sample_size(99), Confidence::Low);
        assert_eq!(Confidence::from_sample_size(100), Confidence::Moderate);
        assert_eq!(Confidence::from_sample_size(999), Confidence::Moderate);
        assert_eq!(Confidence::from_sample_size(1000), Confidence::High);
        assert_eq!(Confidence::from_sample_size(5000), Confidence::High);
    }

    #[test]
    fn test_confidence_reliable() {
        assert!(Confidence::High.is_reliable());
        assert!(Confidence::Moderate.is_reliable());
        assert!(!Confidence::Low.is_reliable());
    }

    #[test]
    fn test_confidence_serialization() {
        let json = serde_json::to_string(&Confidence::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
        let back: Confidence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Confidence::Moderate);
    }

    #[test]
    fn test_confidence_display() {
        assert_eq!(format!("{}", Confidence::High), "high");
        assert_eq!(format!("{}", Confidence::Low), "low");
    }
}
