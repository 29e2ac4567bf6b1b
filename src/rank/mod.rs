//! Percentile ranking against a population distribution.

use serde::{Deserialize, Serialize};

/// Midpoint (tie-aware) percentile rank of `value` within `distribution`.
///
/// Ties contribute half their count, so a value equal to every element of
/// a non-empty distribution ranks exactly 50th. The result is clamped to
/// [1, 99]: nobody is reported as worse or better than literally everyone.
/// An empty distribution yields 0, meaning "no percentile available".
pub fn percentile_rank(value: f64, distribution: &[f64]) -> u8 {
    if distribution.is_empty() {
        return 0;
    }

    let less = distribution.iter().filter(|&&v| v < value).count() as f64;
    let equal = distribution.iter().filter(|&&v| v == value).count() as f64;
    let total = distribution.len() as f64;

    let percentile = ((less + equal / 2.0) / total * 100.0).round();
    percentile.clamp(1.0, 99.0) as u8
}

/// Qualitative band for a percentile, used for insight copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceLevel {
    Elite,
    Excellent,
    Strong,
    Solid,
    Developing,
    Emerging,
    Foundation,
}

impl PerformanceLevel {
    pub fn from_percentile(percentile: u8) -> Self {
        match percentile {
            95..=100 => Self::Elite,
            85..=94 => Self::Excellent,
            75..=84 => Self::Strong,
            50..=74 => Self::Solid,
            25..=49 => Self::Developing,
            10..=24 => Self::Emerging,
            _ => Self::Foundation,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Elite => "elite",
            Self::Excellent => "excellent",
            Self::Strong => "strong",
            Self::Solid => "solid",
            Self::Developing => "developing",
            Self::Emerging => "emerging",
            Self::Foundation => "foundation",
        }
    }
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// English ordinal suffix form, e.g. `73` -> `"73rd"`.
pub fn ordinal(n: u8) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Display label for a percentile, e.g. `"73rd percentile"`.
pub fn percentile_label(percentile: u8) -> String {
    format!("{} percentile", ordinal(percentile))
}
