//! Lift attempts and their signed-magnitude wire encoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single lift attempt.
///
/// Result rows encode attempts as signed-magnitude strings: `"105"` is a
/// made 105 kg lift, `"-105"` a missed one. The sign only denotes make/miss;
/// the weight is always the loaded bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attempt {
    Good(u32),
    Miss(u32),
}

/// A raw attempt field that is neither empty, zero, nor a signed integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a signed attempt weight: {0:?}")]
pub struct ParseAttemptError(pub String);

impl Attempt {
    /// Parse a signed-magnitude attempt string.
    ///
    /// `None`, empty, and `"0"` mean "no attempt taken" and parse to
    /// `Ok(None)`. Anything non-numeric is an error so callers can count it
    /// as a parse anomaly instead of silently treating it as a miss.
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, ParseAttemptError> {
        let raw = match raw {
            Some(s) => s.trim(),
            None => return Ok(None),
        };
        if raw.is_empty() || raw == "0" {
            return Ok(None);
        }

        let value: i64 = raw
            .parse()
            .map_err(|_| ParseAttemptError(raw.to_string()))?;

        match value {
            0 => Ok(None),
            v if v > 0 => Ok(Some(Attempt::Good(v as u32))),
            v => Ok(Some(Attempt::Miss(v.unsigned_abs() as u32))),
        }
    }

    /// Bar weight in kilograms, regardless of outcome.
    pub fn weight(&self) -> u32 {
        match self {
            Attempt::Good(w) | Attempt::Miss(w) => *w,
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, Attempt::Good(_))
    }
}

/// The ordered attempt triple for one lift in one meet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiftAttempts {
    pub first: Option<Attempt>,
    pub second: Option<Attempt>,
    pub third: Option<Attempt>,
}

impl LiftAttempts {
    pub fn new(first: Option<Attempt>, second: Option<Attempt>, third: Option<Attempt>) -> Self {
        Self {
            first,
            second,
            third,
        }
    }

    /// Attempts in order, for iteration.
    pub fn as_array(&self) -> [Option<Attempt>; 3] {
        [self.first, self.second, self.third]
    }

    /// Heaviest successful attempt, if any.
    pub fn best(&self) -> Option<u32> {
        self.as_array()
            .iter()
            .flatten()
            .filter(|a| a.is_good())
            .map(|a| a.weight())
            .max()
    }
}
