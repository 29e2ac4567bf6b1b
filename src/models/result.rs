//! Competition result rows and the parse boundary.
//!
//! The result store serves loosely typed rows (attempt fields as
//! signed-magnitude strings, numerics sometimes strings, most fields
//! nullable). Rows are converted into [`CompetitionResult`] exactly once, at
//! the fetch boundary; malformed fields are counted as anomalies instead of
//! being coerced to zero inside the metrics code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::{Attempt, LiftAttempts, LifterId};

/// Athlete gender as stored ("M"/"F").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "M" | "m" => Some(Gender::M),
            "F" | "f" => Some(Gender::F),
            _ => None,
        }
    }
}

/// A result row as it comes off the wire. Everything optional, numbers
/// possibly strings; never consumed directly by the metrics code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawResultRow {
    pub lifter_id: Option<String>,
    pub lifter_name: Option<String>,
    pub meet_name: Option<String>,
    pub date: Option<String>,
    pub level: Option<String>,
    pub gender: Option<String>,
    pub age_category: Option<String>,
    pub competition_age: Option<i32>,
    pub body_weight_kg: Option<String>,
    pub snatch_lift_1: Option<String>,
    pub snatch_lift_2: Option<String>,
    pub snatch_lift_3: Option<String>,
    pub best_snatch: Option<String>,
    pub cj_lift_1: Option<String>,
    pub cj_lift_2: Option<String>,
    pub cj_lift_3: Option<String>,
    pub best_cj: Option<String>,
    pub total: Option<String>,
    pub best_snatch_ytd: Option<u32>,
    pub best_cj_ytd: Option<u32>,
    pub best_total_ytd: Option<u32>,
    pub qpoints: Option<f64>,
    pub q_youth: Option<f64>,
    pub q_masters: Option<f64>,
}

/// A row that cannot be used at all.
#[derive(Debug, Error)]
pub enum RowParseError {
    #[error("row has no lifter id")]
    MissingLifterId,

    #[error("row has no usable date: {0:?}")]
    BadDate(Option<String>),
}

/// Tally of what happened while parsing a batch of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Rows converted successfully.
    pub parsed: usize,
    /// Rows dropped entirely (bad date or missing lifter id).
    pub skipped_rows: usize,
    /// Individual fields that failed to parse on otherwise-usable rows.
    pub field_anomalies: usize,
}

/// One athlete's entry in one meet, fully typed. Immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionResult {
    pub lifter_id: LifterId,
    pub date: NaiveDate,
    pub meet_name: Option<String>,
    pub level: Option<String>,
    pub gender: Option<Gender>,
    pub age_category: Option<String>,
    pub competition_age: Option<u32>,
    pub body_weight_kg: Option<f64>,
    pub snatch: LiftAttempts,
    pub clean_jerk: LiftAttempts,
    pub best_snatch: Option<u32>,
    pub best_cj: Option<u32>,
    pub total: Option<u32>,
    pub best_snatch_ytd: Option<u32>,
    pub best_cj_ytd: Option<u32>,
    pub best_total_ytd: Option<u32>,
    pub qpoints: Option<f64>,
    pub q_youth: Option<f64>,
    pub q_masters: Option<f64>,
}

impl CompetitionResult {
    /// Convert a raw row, counting per-field anomalies into `report`.
    ///
    /// Only a missing lifter id or an unusable date rejects the whole row;
    /// any other malformed field becomes "no value" plus an anomaly count.
    pub fn from_raw(raw: &RawResultRow, report: &mut ParseReport) -> Result<Self, RowParseError> {
        let lifter_id = raw
            .lifter_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(LifterId::from)
            .ok_or(RowParseError::MissingLifterId)?;

        let date = raw
            .date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .ok_or_else(|| RowParseError::BadDate(raw.date.clone()))?;

        let mut anomalies = 0usize;
        let mut attempt = |field: &Option<String>| -> Option<Attempt> {
            match Attempt::parse(field.as_deref()) {
                Ok(a) => a,
                Err(_) => {
                    anomalies += 1;
                    None
                }
            }
        };

        let snatch = LiftAttempts::new(
            attempt(&raw.snatch_lift_1),
            attempt(&raw.snatch_lift_2),
            attempt(&raw.snatch_lift_3),
        );
        let clean_jerk = LiftAttempts::new(
            attempt(&raw.cj_lift_1),
            attempt(&raw.cj_lift_2),
            attempt(&raw.cj_lift_3),
        );

        let mut weight_field = |field: &Option<String>| -> Option<u32> {
            match Attempt::parse(field.as_deref()) {
                Ok(a) => a.filter(|a| a.is_good()).map(|a| a.weight()),
                Err(_) => {
                    anomalies += 1;
                    None
                }
            }
        };

        let best_snatch = weight_field(&raw.best_snatch);
        let best_cj = weight_field(&raw.best_cj);
        let total = weight_field(&raw.total);

        let body_weight_kg = match raw.body_weight_kg.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => match s.parse::<f64>() {
                Ok(v) if v > 0.0 => Some(v),
                Ok(_) => None,
                Err(_) => {
                    anomalies += 1;
                    None
                }
            },
        };

        report.field_anomalies += anomalies;

        Ok(Self {
            lifter_id,
            date,
            meet_name: raw.meet_name.clone(),
            level: raw.level.clone(),
            gender: raw.gender.as_deref().and_then(Gender::parse),
            age_category: raw.age_category.clone(),
            competition_age: raw.competition_age.filter(|a| *a > 0).map(|a| a as u32),
            body_weight_kg,
            snatch,
            clean_jerk,
            best_snatch,
            best_cj,
            total,
            best_snatch_ytd: raw.best_snatch_ytd,
            best_cj_ytd: raw.best_cj_ytd,
            best_total_ytd: raw.best_total_ytd,
            qpoints: raw.qpoints,
            q_youth: raw.q_youth,
            q_masters: raw.q_masters,
        })
    }

    /// Q-score values that are actually present and positive.
    pub fn q_scores(&self) -> impl Iterator<Item = f64> + '_ {
        [self.qpoints, self.q_youth, self.q_masters]
            .into_iter()
            .flatten()
            .filter(|q| *q > 0.0)
    }
}

/// Parse a batch of raw rows, dropping unusable ones with a warning.
pub fn parse_rows(rows: &[RawResultRow]) -> (Vec<CompetitionResult>, ParseReport) {
    let mut report = ParseReport::default();
    let mut parsed = Vec::with_capacity(rows.len());

    for raw in rows {
        match CompetitionResult::from_raw(raw, &mut report) {
            Ok(result) => parsed.push(result),
            Err(e) => {
                report.skipped_rows += 1;
                warn!("Skipping unparseable result row: {}", e);
            }
        }
    }

    report.parsed = parsed.len();
    (parsed, report)
}
