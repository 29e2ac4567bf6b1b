//! Lifter identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one athlete, as assigned by the result store.
///
/// Opaque to this crate: USAW rows carry numeric ids, IWF rows carry
/// name-based keys. Only equality matters here (deduplication).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifterId(String);

impl LifterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LifterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for LifterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LifterId({})", self.0)
    }
}

impl From<String> for LifterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LifterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
