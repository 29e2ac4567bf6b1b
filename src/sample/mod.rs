//! Population sampling.
//!
//! Builds [`PopulationStats`] for a demographic filter by counting the
//! matching rows, fetching a bounded sample, deduplicating to one recent
//! result per athlete, and turning each athlete's row into per-metric
//! values. Sampling never fails outward: any error or timeout degrades to
//! the hardcoded fallback stats.

pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::calculate;
use crate::models::{
    Attempt, CompetitionResult, Confidence, DemographicFilter, PopulationMetric, PopulationStats,
};
use crate::store::{ResultStore, StoreError};
use retry::{run_with_retry, RetryPolicy};

/// Row cap applied to very large populations.
pub const LARGE_POPULATION_LIMIT: u32 = 2500;

/// Count threshold at which the cap kicks in.
pub const LARGE_POPULATION_THRESHOLD: u64 = 5000;

/// Confidence tier and fetch cap for a population of `total` rows.
///
/// Confidence comes straight from the size thresholds; only populations at
/// or past [`LARGE_POPULATION_THRESHOLD`] get capped. The tiers below that
/// fetch everything the filter matches.
pub fn sampling_plan(total: u64) -> (Confidence, Option<u32>) {
    let confidence = Confidence::from_sample_size(total);
    let limit = (total >= LARGE_POPULATION_THRESHOLD).then_some(LARGE_POPULATION_LIMIT);
    (confidence, limit)
}

/// Keep one result per athlete, the most recent.
pub fn dedup_latest(mut results: Vec<CompetitionResult>) -> Vec<CompetitionResult> {
    results.sort_by(|a, b| b.date.cmp(&a.date));
    let mut seen = std::collections::HashSet::new();
    results.retain(|r| seen.insert(r.lifter_id.clone()));
    results
}

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub overall_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct PopulationSampler {
    store: Arc<dyn ResultStore>,
    settings: SamplerSettings,
}

impl PopulationSampler {
    pub fn new(store: Arc<dyn ResultStore>, settings: SamplerSettings) -> Self {
        Self { store, settings }
    }

    /// Sample the population behind `filter`. Infallible by contract:
    /// store errors, timeouts, and empty populations all degrade to
    /// [`PopulationStats::fallback`].
    pub async fn population_stats(&self, filter: &DemographicFilter) -> PopulationStats {
        let demographic = filter.describe();
        match tokio::time::timeout(self.settings.overall_timeout, self.sample(filter)).await {
            Ok(Ok(stats)) => stats,
            Ok(Err(error)) => {
                warn!(%error, demographic, "population sampling failed, using fallback stats");
                PopulationStats::fallback(demographic)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.settings.overall_timeout.as_secs(),
                    demographic, "population sampling timed out, using fallback stats"
                );
                PopulationStats::fallback(demographic)
            }
        }
    }

    async fn sample(&self, filter: &DemographicFilter) -> Result<PopulationStats, StoreError> {
        let total = run_with_retry(self.settings.retry, "count_results", || {
            self.store.count_results(filter)
        })
        .await?;

        let demographic = filter.describe();
        if total == 0 {
            info!(demographic, "no results match filter, using fallback stats");
            return Ok(PopulationStats::fallback(demographic));
        }

        let (confidence, limit) = sampling_plan(total);
        debug!(total, ?limit, %confidence, demographic, "sampling population");

        let rows = run_with_retry(self.settings.retry, "fetch_results", || {
            self.store.fetch_results(filter, limit)
        })
        .await?;

        let (results, report) = crate::models::parse_rows(&rows);
        if report.skipped_rows > 0 || report.field_anomalies > 0 {
            debug!(
                skipped = report.skipped_rows,
                anomalies = report.field_anomalies,
                "sample rows had parse issues"
            );
        }

        let athletes = dedup_latest(results);
        if athletes.is_empty() {
            info!(demographic, "no parseable athletes in sample, using fallback stats");
            return Ok(PopulationStats::fallback(demographic));
        }

        Ok(build_stats(&athletes, confidence, demographic))
    }
}

/// Per-athlete metric values extracted from one recent result each.
#[derive(Default)]
struct MetricValues {
    success: Vec<f64>,
    snatch_success: Vec<f64>,
    cj_success: Vec<f64>,
    consistency: Vec<f64>,
    clutch: Vec<f64>,
    bounce_back: Vec<f64>,
    snatch_bounce_back: Vec<f64>,
    cj_bounce_back: Vec<f64>,
    q_score: Vec<f64>,
}

fn build_stats(
    athletes: &[CompetitionResult],
    confidence: Confidence,
    demographic: String,
) -> PopulationStats {
    let mut values = MetricValues::default();

    for athlete in athletes {
        let single = std::slice::from_ref(athlete);

        let snatch: Vec<Option<Attempt>> = athlete.snatch.as_array().to_vec();
        let cj: Vec<Option<Attempt>> = athlete.clean_jerk.as_array().to_vec();
        let all: Vec<Option<Attempt>> = snatch.iter().chain(cj.iter()).copied().collect();

        if let Some(rate) = calculate::success_rate(&all) {
            values.success.push(rate);
            // One meet is too little signal for a real coefficient of
            // variation, so consistency is proxied off the success rate,
            // clamped to a plausible band.
            values.consistency.push(rate.clamp(40.0, 95.0));
        }
        if let Some(rate) = calculate::success_rate(&snatch) {
            values.snatch_success.push(rate);
        }
        if let Some(rate) = calculate::success_rate(&cj) {
            values.cj_success.push(rate);
        }
        // An athlete who never faced the situation still belongs in the
        // clutch and bounce-back populations, at 0. Most athletes never
        // do, which is what makes a nonzero rate rank highly.
        values.clutch.push(calculate::clutch_rate(single).unwrap_or(0.0));
        values
            .bounce_back
            .push(calculate::overall_bounce_back(single).unwrap_or(0.0));
        let per_lift = calculate::bounce_back_rates(single);
        values.snatch_bounce_back.push(per_lift.snatch.unwrap_or(0.0));
        values.cj_bounce_back.push(per_lift.clean_jerk.unwrap_or(0.0));
        if let Some(best) = athlete.q_scores().fold(None::<f64>, |b, q| {
            Some(b.map_or(q, |b| b.max(q)))
        }) {
            values.q_score.push(best);
        }
    }

    // Zero is a real observation for clutch and bounce-back (the athlete
    // faced the situation and failed); for the rate and score metrics a
    // zero means no usable data and is dropped.
    PopulationStats {
        success_rate: PopulationMetric::from_values(&values.success, false, confidence),
        snatch_success_rate: PopulationMetric::from_values(&values.snatch_success, false, confidence),
        clean_jerk_success_rate: PopulationMetric::from_values(&values.cj_success, false, confidence),
        consistency_score: PopulationMetric::from_values(&values.consistency, false, confidence),
        clutch_rate: PopulationMetric::from_values(&values.clutch, true, confidence),
        bounce_back_rate: PopulationMetric::from_values(&values.bounce_back, true, confidence),
        snatch_bounce_back_rate: PopulationMetric::from_values(
            &values.snatch_bounce_back,
            true,
            confidence,
        ),
        clean_jerk_bounce_back_rate: PopulationMetric::from_values(
            &values.cj_bounce_back,
            true,
            confidence,
        ),
        // Frequency needs a multi-year result history per athlete, which a
        // single-row sample cannot provide.
        competition_frequency: PopulationMetric::fallback(
            crate::models::fallback_means::COMPETITION_FREQUENCY,
        ),
        q_score: PopulationMetric::from_values(&values.q_score, false, confidence),
        demographic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawResultRow;
    use crate::store::MockResultStore;

    fn row(lifter: &str, date: &str, snatch: [i32; 3], cj: [i32; 3]) -> RawResultRow {
        let lift = |v: i32| (v != 0).then(|| v.to_string());
        RawResultRow {
            lifter_id: Some(lifter.to_string()),
            date: Some(date.to_string()),
            snatch_lift_1: lift(snatch[0]),
            snatch_lift_2: lift(snatch[1]),
            snatch_lift_3: lift(snatch[2]),
            cj_lift_1: lift(cj[0]),
            cj_lift_2: lift(cj[1]),
            cj_lift_3: lift(cj[2]),
            ..Default::default()
        }
    }

    fn fast_settings() -> SamplerSettings {
        SamplerSettings {
            overall_timeout: Duration::from_secs(10),
            retry: RetryPolicy {
                max_retries: 1,
                delay: Duration::ZERO,
            },
        }
    }

    #[test]
    fn test_sampling_plan_tiers() {
        assert_eq!(sampling_plan(50), (Confidence::Low, None));
        assert_eq!(sampling_plan(999), (Confidence::Moderate, None));
        assert_eq!(sampling_plan(1000), (Confidence::High, None));
        assert_eq!(sampling_plan(4999), (Confidence::High, None));
        assert_eq!(sampling_plan(5000), (Confidence::High, Some(2500)));
    }

    #[test]
    fn test_dedup_keeps_most_recent() {
        let rows = vec![
            row("1", "2023-01-15", [90, 0, 0], [110, 0, 0]),
            row("1", "2024-06-01", [95, 0, 0], [115, 0, 0]),
            row("2", "2024-03-01", [80, 0, 0], [100, 0, 0]),
        ];
        let (results, _) = crate::models::parse_rows(&rows);
        let deduped = dedup_latest(results);

        assert_eq!(deduped.len(), 2);
        let athlete_one = deduped
            .iter()
            .find(|r| r.lifter_id.as_str() == "1")
            .unwrap();
        assert_eq!(athlete_one.date.to_string(), "2024-06-01");
    }

    #[tokio::test]
    async fn test_empty_population_falls_back() {
        let store = Arc::new(MockResultStore::default());
        let sampler = PopulationSampler::new(store, fast_settings());

        let stats = sampler.population_stats(&DemographicFilter::default()).await;
        assert!(stats.is_fallback());
        assert_eq!(stats.demographic, "athletes");
    }

    #[tokio::test]
    async fn test_samples_real_rows() {
        let rows = vec![
            row("1", "2024-06-01", [90, 95, -100], [110, 115, 120]),
            row("2", "2024-05-01", [-80, 84, 88], [-100, -106, 108]),
            row("3", "2024-04-01", [70, 0, 0], [90, 0, 0]),
        ];
        let store = Arc::new(MockResultStore::with_rows(rows));
        let sampler = PopulationSampler::new(store, fast_settings());

        let stats = sampler.population_stats(&DemographicFilter::default()).await;
        assert!(!stats.is_fallback());
        assert_eq!(stats.success_rate.sample_size, 3);
        assert_eq!(stats.success_rate.confidence, Confidence::Low);
        // Only athlete 2 failed an opener: made the snatch retake, missed
        // the clean & jerk one. Athletes 1 and 3 never faced it and sit
        // at 0.
        assert_eq!(
            stats.snatch_bounce_back_rate.distribution,
            vec![0.0, 0.0, 100.0]
        );
        assert_eq!(
            stats.clean_jerk_bounce_back_rate.distribution,
            vec![0.0, 0.0, 0.0]
        );
    }

    #[tokio::test]
    async fn test_no_situation_athletes_count_as_zero() {
        // Athlete 1 makes everything; athlete 2 misses two snatches and
        // saves the third. Both belong in the clutch population.
        let rows = vec![
            row("1", "2024-06-01", [90, 95, 100], [110, 115, 120]),
            row("2", "2024-05-01", [-90, -95, 95], [110, 115, 120]),
        ];
        let store = Arc::new(MockResultStore::with_rows(rows));
        let sampler = PopulationSampler::new(store, fast_settings());

        let stats = sampler.population_stats(&DemographicFilter::default()).await;
        assert_eq!(stats.clutch_rate.distribution, vec![0.0, 100.0]);
        assert_eq!(stats.clutch_rate.sample_size, 2);
        // Athlete 2's second snatch was also a miss, so their bounce-back
        // is a real 0; athlete 1's is a no-situation 0.
        assert_eq!(stats.bounce_back_rate.distribution, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let rows = vec![row("1", "2024-06-01", [90, 95, -100], [110, 115, 120])];
        let store = Arc::new(MockResultStore::with_rows(rows).failing_times(1));
        let sampler = PopulationSampler::new(store, fast_settings());

        let stats = sampler.population_stats(&DemographicFilter::default()).await;
        assert!(!stats.is_fallback());
    }

    #[tokio::test]
    async fn test_structural_failure_falls_back() {
        let store = Arc::new(MockResultStore::default().structural_failure());
        let sampler = PopulationSampler::new(store, fast_settings());

        let stats = sampler.population_stats(&DemographicFilter::default()).await;
        assert!(stats.is_fallback());
    }

    #[tokio::test]
    async fn test_frequency_is_always_a_fallback() {
        let rows = vec![row("1", "2024-06-01", [90, 0, 0], [110, 0, 0])];
        let store = Arc::new(MockResultStore::with_rows(rows));
        let sampler = PopulationSampler::new(store, fast_settings());

        let stats = sampler.population_stats(&DemographicFilter::default()).await;
        assert!(!stats.competition_frequency.has_distribution());
        assert_eq!(stats.competition_frequency.mean, 3.5);
    }

    #[tokio::test]
    async fn test_large_population_caps_fetch() {
        let rows: Vec<RawResultRow> = (0..10)
            .map(|i| row(&i.to_string(), "2024-06-01", [90, 0, 0], [110, 0, 0]))
            .collect();
        let store = Arc::new(MockResultStore::with_rows(rows).with_count(6000));
        let sampler = PopulationSampler::new(store, fast_settings());

        let stats = sampler.population_stats(&DemographicFilter::default()).await;
        // Confidence reflects the full population, not the capped fetch.
        assert_eq!(stats.success_rate.confidence, Confidence::High);
    }
}
