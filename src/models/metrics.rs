//! Derived per-athlete metrics.

use serde::{Deserialize, Serialize};

/// Success rates, as percentages in [0, 100]. `None` means no valid
/// attempts existed ("no data", never "0%").
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessRates {
    pub overall: Option<f64>,
    pub snatch: Option<f64>,
    pub clean_jerk: Option<f64>,
    pub snatch_by_attempt: AttemptRates,
    pub clean_jerk_by_attempt: AttemptRates,
}

/// Success rate per attempt number (1st/2nd/3rd) for one lift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptRates {
    pub first: Option<f64>,
    pub second: Option<f64>,
    pub third: Option<f64>,
}

/// Performance stability across meets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyScore {
    /// `100 - coefficient_of_variation`, floored at 0. Exactly 100 with
    /// fewer than two totals.
    pub score: f64,
    pub coefficient_of_variation: f64,
}

/// Recovery rate after a missed opener, per lift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BounceBackRates {
    pub snatch: Option<f64>,
    pub clean_jerk: Option<f64>,
}

/// Average weight deltas between attempts for one lift, in kg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpAverages {
    pub first_to_second: Option<f64>,
    pub second_to_third: Option<f64>,
    pub full_range: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptJumps {
    pub snatch: JumpAverages,
    pub clean_jerk: JumpAverages,
}

/// Year-over-year career trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Mean of all year-over-year percentage deltas in best total.
    pub career_trend: Option<f64>,
    /// Mean of the last two deltas.
    pub recent_trend: Option<f64>,
    /// Consecutive improving years ending at the most recent year.
    pub improvement_streak: u32,
    /// Longest improving run anywhere in the career.
    pub best_streak: u32,
}

/// Opening-attempt risk posture, classified from the average opener as a
/// percentage of the previous meet's best lift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpenerStrategy {
    Conservative,
    Balanced,
    Aggressive,
    #[default]
    InsufficientData,
}

impl OpenerStrategy {
    /// Classify an average opener percentage: at most 88% is conservative,
    /// at least 93% aggressive, in between balanced.
    pub fn from_average(avg: Option<f64>) -> Self {
        match avg {
            None => OpenerStrategy::InsufficientData,
            Some(p) if p <= 88.0 => OpenerStrategy::Conservative,
            Some(p) if p >= 93.0 => OpenerStrategy::Aggressive,
            Some(_) => OpenerStrategy::Balanced,
        }
    }
}

impl std::fmt::Display for OpenerStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenerStrategy::Conservative => write!(f, "conservative"),
            OpenerStrategy::Balanced => write!(f, "balanced"),
            OpenerStrategy::Aggressive => write!(f, "aggressive"),
            OpenerStrategy::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenerSummary {
    pub strategy: OpenerStrategy,
    /// Average opener as % of previous meet's best snatch.
    pub snatch_average: Option<f64>,
    /// Average opener as % of previous meet's best clean & jerk.
    pub clean_jerk_average: Option<f64>,
    /// Average across both lifts; drives the classification.
    pub overall_average: Option<f64>,
}

/// Which normalized score variant produced the athlete's best value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QScoreVariant {
    Qpoints,
    QYouth,
    QMasters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QScoreSummary {
    pub best: Option<f64>,
    pub average: Option<f64>,
    pub best_variant: Option<QScoreVariant>,
}

/// The full derived profile for one athlete. Recomputed from the result
/// list on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteMetrics {
    pub success: SuccessRates,
    pub consistency: ConsistencyScore,
    /// Success rate on must-make third attempts after two misses,
    /// across both lifts. `None` when no such situation ever arose.
    pub clutch_rate: Option<f64>,
    pub bounce_back: BounceBackRates,
    pub jumps: AttemptJumps,
    pub total_competitions: u32,
    /// Span from first to last competition year, inclusive.
    pub years_active: u32,
    pub competition_frequency: f64,
    pub trend: TrendSummary,
    pub opener: OpenerSummary,
    pub q_score: QScoreSummary,
}
