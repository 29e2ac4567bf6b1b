//! Access to federation results databases.
//!
//! [`ResultStore`] is the async boundary the sampler and API sit on top
//! of; [`RestResultStore`] talks to a PostgREST-style HTTP endpoint and
//! [`MockResultStore`] scripts responses for tests.

mod mock;
mod rest;

pub use mock::MockResultStore;
pub use rest::RestResultStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DemographicFilter, Federation, LifterId, RawResultRow};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unknown column in query: {0}")]
    UnknownColumn(String),

    #[error("unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("response missing result count")]
    MissingCount,

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    /// Structural errors describe a malformed query and will fail the same
    /// way on every retry.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::BadRequest(_) | Self::UnknownColumn(_))
    }

    pub fn is_retryable(&self) -> bool {
        !self.is_structural()
    }
}

/// Read-only view over a federation's competition results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Number of rows matching the filter, without fetching them.
    async fn count_results(&self, filter: &DemographicFilter) -> Result<u64, StoreError>;

    /// Rows matching the filter, most recent first, optionally capped.
    async fn fetch_results(
        &self,
        filter: &DemographicFilter,
        limit: Option<u32>,
    ) -> Result<Vec<RawResultRow>, StoreError>;

    /// Every result for one athlete, most recent first.
    async fn fetch_athlete_results(
        &self,
        lifter: &LifterId,
        federation: Federation,
    ) -> Result<Vec<RawResultRow>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_are_not_retryable() {
        let bad = StoreError::BadRequest("malformed filter".into());
        assert!(bad.is_structural());
        assert!(!bad.is_retryable());

        let column = StoreError::UnknownColumn("best_total_ytd".into());
        assert!(column.is_structural());
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        let err = StoreError::UnexpectedStatus {
            status: 503,
            body: "service unavailable".into(),
        };
        assert!(err.is_retryable());
        assert!(StoreError::MissingCount.is_retryable());
    }
}
