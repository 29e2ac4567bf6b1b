//! Population distributions and demographic filters.

use serde::{Deserialize, Serialize};

use super::{Confidence, Gender};

/// Which federation's result collection to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Federation {
    #[default]
    Usaw,
    Iwf,
}

impl std::fmt::Display for Federation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Federation::Usaw => write!(f, "usaw"),
            Federation::Iwf => write!(f, "iwf"),
        }
    }
}

/// Immutable descriptor of which rows populate a distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicFilter {
    pub gender: Option<Gender>,
    pub age_category: Option<String>,
    pub competition_level: Option<String>,
    pub federation: Federation,
}

impl DemographicFilter {
    /// Human-readable description for context sentences,
    /// e.g. "female athletes in Junior 59kg".
    pub fn describe(&self) -> String {
        let mut desc = String::new();
        match self.gender {
            Some(Gender::M) => desc.push_str("male "),
            Some(Gender::F) => desc.push_str("female "),
            None => {}
        }
        desc.push_str("athletes");
        if let Some(ref cat) = self.age_category {
            desc.push_str(" in ");
            desc.push_str(cat);
        }
        if let Some(ref level) = self.competition_level {
            desc.push_str(" at ");
            desc.push_str(level);
            desc.push_str(" level");
        }
        desc
    }
}

/// One statistic across a sampled set of distinct athletes.
///
/// `distribution` holds one value per athlete, sorted ascending; it is
/// what the percentile ranker consumes. Quartiles and mean are convenience
/// summaries of the same array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationMetric {
    pub distribution: Vec<f64>,
    pub percentile_25: f64,
    pub percentile_50: f64,
    pub percentile_75: f64,
    pub mean: f64,
    pub sample_size: u32,
    pub confidence: Confidence,
}

impl PopulationMetric {
    /// Build from per-athlete values. `include_zeros` keeps zero values as
    /// meaningful data points (clutch, bounce-back); otherwise zeros are
    /// dropped as "no data".
    pub fn from_values(values: &[f64], include_zeros: bool, confidence: Confidence) -> Self {
        let mut sorted: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| include_zeros || *v > 0.0)
            .collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        if sorted.is_empty() {
            return Self::default();
        }

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let quartile = |q: f64| sorted[((n as f64 * q) as usize).min(n - 1)];

        Self {
            percentile_25: quartile(0.25),
            percentile_50: quartile(0.50),
            percentile_75: quartile(0.75),
            mean: crate::round1(mean),
            sample_size: n as u32,
            distribution: sorted,
            confidence,
        }
    }

    /// An approximate stand-in when sampling failed or matched nothing:
    /// no distribution, just a hardcoded mean for context sentences.
    pub fn fallback(mean: f64) -> Self {
        Self {
            mean,
            confidence: Confidence::Low,
            ..Self::default()
        }
    }

    /// Whether percentile ranking against this metric is possible.
    pub fn has_distribution(&self) -> bool {
        !self.distribution.is_empty()
    }
}

/// The full set of population metrics for one demographic filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub success_rate: PopulationMetric,
    pub snatch_success_rate: PopulationMetric,
    pub clean_jerk_success_rate: PopulationMetric,
    pub consistency_score: PopulationMetric,
    pub clutch_rate: PopulationMetric,
    pub bounce_back_rate: PopulationMetric,
    pub snatch_bounce_back_rate: PopulationMetric,
    pub clean_jerk_bounce_back_rate: PopulationMetric,
    pub competition_frequency: PopulationMetric,
    pub q_score: PopulationMetric,
    pub demographic: String,
}

/// Hardcoded approximate means used when no sample is available.
pub mod fallback_means {
    pub const SUCCESS_RATE: f64 = 75.0;
    pub const SNATCH_SUCCESS_RATE: f64 = 72.0;
    pub const CLEAN_JERK_SUCCESS_RATE: f64 = 78.0;
    pub const CONSISTENCY_SCORE: f64 = 75.0;
    pub const CLUTCH_RATE: f64 = 48.0;
    pub const BOUNCE_BACK_RATE: f64 = 62.0;
    pub const SNATCH_BOUNCE_BACK_RATE: f64 = 58.0;
    pub const CLEAN_JERK_BOUNCE_BACK_RATE: f64 = 65.0;
    pub const COMPETITION_FREQUENCY: f64 = 3.5;
    pub const Q_SCORE: f64 = 55.0;
}

impl PopulationStats {
    /// All-fallback stats: sample size 0, low confidence, hardcoded means.
    pub fn fallback(demographic: String) -> Self {
        use fallback_means::*;
        Self {
            success_rate: PopulationMetric::fallback(SUCCESS_RATE),
            snatch_success_rate: PopulationMetric::fallback(SNATCH_SUCCESS_RATE),
            clean_jerk_success_rate: PopulationMetric::fallback(CLEAN_JERK_SUCCESS_RATE),
            consistency_score: PopulationMetric::fallback(CONSISTENCY_SCORE),
            clutch_rate: PopulationMetric::fallback(CLUTCH_RATE),
            bounce_back_rate: PopulationMetric::fallback(BOUNCE_BACK_RATE),
            snatch_bounce_back_rate: PopulationMetric::fallback(SNATCH_BOUNCE_BACK_RATE),
            clean_jerk_bounce_back_rate: PopulationMetric::fallback(CLEAN_JERK_BOUNCE_BACK_RATE),
            competition_frequency: PopulationMetric::fallback(COMPETITION_FREQUENCY),
            q_score: PopulationMetric::fallback(Q_SCORE),
            demographic,
        }
    }

    /// True when every metric is a fallback (no distributions anywhere).
    pub fn is_fallback(&self) -> bool {
        !self.success_rate.has_distribution()
            && !self.clutch_rate.has_distribution()
            && !self.q_score.has_distribution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_describe() {
        let mut filter = DemographicFilter::default();
        assert_eq!(filter.describe(), "athletes");

        filter.gender = Some(Gender::F);
        filter.age_category = Some("Junior".to_string());
        assert_eq!(filter.describe(), "female athletes in Junior");

        filter.competition_level = Some("National".to_string());
        assert_eq!(
            filter.describe(),
            "female athletes in Junior at National level"
        );
    }

    #[test]
    fn test_metric_from_values_sorted() {
        let metric =
            PopulationMetric::from_values(&[80.0, 40.0, 60.0], false, Confidence::Moderate);
        assert_eq!(metric.distribution, vec![40.0, 60.0, 80.0]);
        assert_eq!(metric.sample_size, 3);
        assert_eq!(metric.mean, 60.0);
        assert_eq!(metric.confidence, Confidence::Moderate);
    }

    #[test]
    fn test_metric_zero_policy() {
        let values = [0.0, 50.0, 100.0];

        let without = PopulationMetric::from_values(&values, false, Confidence::High);
        assert_eq!(without.distribution, vec![50.0, 100.0]);

        let with = PopulationMetric::from_values(&values, true, Confidence::High);
        assert_eq!(with.distribution, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_metric_empty_after_filtering() {
        let metric = PopulationMetric::from_values(&[0.0, 0.0], false, Confidence::High);
        assert_eq!(metric.sample_size, 0);
        assert!(!metric.has_distribution());
        assert_eq!(metric.confidence, Confidence::Low);
    }

    #[test]
    fn test_metric_quartiles() {
        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let metric = PopulationMetric::from_values(&values, true, Confidence::Moderate);
        assert_eq!(metric.percentile_25, 26.0);
        assert_eq!(metric.percentile_50, 51.0);
        assert_eq!(metric.percentile_75, 76.0);
    }

    #[test]
    fn test_fallback_stats() {
        let stats = PopulationStats::fallback("all athletes".to_string());
        assert!(stats.is_fallback());
        assert_eq!(stats.success_rate.mean, 75.0);
        assert_eq!(stats.success_rate.sample_size, 0);
        assert_eq!(stats.success_rate.confidence, Confidence::Low);
        assert_eq!(stats.demographic, "all athletes");
    }

    #[test]
    fn test_federation_serialization() {
        assert_eq!(serde_json::to_string(&Federation::Iwf).unwrap(), "\"iwf\"");
        assert_eq!(
            serde_json::from_str::<Federation>("\"usaw\"").unwrap(),
            Federation::Usaw
        );
    }
}
