//! Scripted in-memory store for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{ResultStore, StoreError};
use crate::models::{DemographicFilter, Federation, LifterId, RawResultRow};

/// In-memory [`ResultStore`] that serves canned rows and can be scripted
/// to fail a number of times before succeeding, which is how the sampler's
/// retry path gets exercised.
#[derive(Default)]
pub struct MockResultStore {
    rows: Vec<RawResultRow>,
    count_override: Option<u64>,
    failures: Mutex<u32>,
    structural: bool,
}

impl MockResultStore {
    pub fn with_rows(rows: Vec<RawResultRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Report this count instead of `rows.len()`; rows are still served
    /// as-is. Lets tests drive the sampling tiers without building
    /// thousands of rows.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count_override = Some(count);
        self
    }

    /// Fail the next `n` calls with a transient error.
    pub fn failing_times(mut self, n: u32) -> Self {
        *self.failures.get_mut().expect("fresh mutex") = n;
        self
    }

    /// Fail every call with a structural (non-retryable) error.
    pub fn structural_failure(mut self) -> Self {
        self.structural = true;
        self
    }

    fn maybe_fail(&self) -> Result<(), StoreError> {
        if self.structural {
            return Err(StoreError::UnknownColumn("best_total_ytd".into()));
        }
        let mut remaining = self.failures.lock().expect("mock store lock");
        if *remaining > 0 {
            *remaining -= 1;
            return Err(StoreError::UnexpectedStatus {
                status: 503,
                body: "scripted failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MockResultStore {
    async fn count_results(&self, _filter: &DemographicFilter) -> Result<u64, StoreError> {
        self.maybe_fail()?;
        Ok(self.count_override.unwrap_or(self.rows.len() as u64))
    }

    async fn fetch_results(
        &self,
        _filter: &DemographicFilter,
        limit: Option<u32>,
    ) -> Result<Vec<RawResultRow>, StoreError> {
        self.maybe_fail()?;
        let mut rows = self.rows.clone();
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn fetch_athlete_results(
        &self,
        lifter: &LifterId,
        _federation: Federation,
    ) -> Result<Vec<RawResultRow>, StoreError> {
        self.maybe_fail()?;
        Ok(self
            .rows
            .iter()
            .filter(|r| r.lifter_id.as_deref() == Some(lifter.as_str()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(lifter: &str) -> RawResultRow {
        RawResultRow {
            lifter_id: Some(lifter.to_string()),
            date: Some("2024-06-01".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_serves_rows_and_count() {
        let store = MockResultStore::with_rows(vec![row("1"), row("2")]);
        let filter = DemographicFilter::default();

        assert_eq!(store.count_results(&filter).await.unwrap(), 2);
        assert_eq!(store.fetch_results(&filter, None).await.unwrap().len(), 2);
        assert_eq!(store.fetch_results(&filter, Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_count_override() {
        let store = MockResultStore::with_rows(vec![row("1")]).with_count(5000);
        let filter = DemographicFilter::default();
        assert_eq!(store.count_results(&filter).await.unwrap(), 5000);
    }

    #[tokio::test]
    async fn test_fails_then_recovers() {
        let store = MockResultStore::with_rows(vec![row("1")]).failing_times(1);
        let filter = DemographicFilter::default();

        let first = store.count_results(&filter).await;
        assert!(first.unwrap_err().is_retryable());
        assert_eq!(store.count_results(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_structural_failure_persists() {
        let store = MockResultStore::default().structural_failure();
        let filter = DemographicFilter::default();

        for _ in 0..2 {
            let err = store.count_results(&filter).await.unwrap_err();
            assert!(err.is_structural());
        }
    }

    #[tokio::test]
    async fn test_athlete_lookup_filters_by_id() {
        let store = MockResultStore::with_rows(vec![row("1"), row("2"), row("1")]);
        let results = store
            .fetch_athlete_results(&LifterId::from("1"), Federation::Usaw)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }
}
