use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate;
use crate::models::{
    parse_rows, AthleteMetrics, DemographicFilter, Federation, LifterId, PopulationMetric,
    PopulationStats,
};
use crate::rank::percentile_rank;

#[derive(Debug, Deserialize)]
pub struct ProfileParams {
    pub federation: Option<String>,
}

/// Percentile of each athlete metric within its population distribution.
/// `None` when the athlete has no value for the metric or the population
/// has no distribution to rank against.
#[derive(Debug, Default, Serialize)]
pub struct MetricPercentiles {
    pub success_rate: Option<u8>,
    pub snatch_success_rate: Option<u8>,
    pub clean_jerk_success_rate: Option<u8>,
    pub consistency_score: Option<u8>,
    pub clutch_rate: Option<u8>,
    pub snatch_bounce_back_rate: Option<u8>,
    pub clean_jerk_bounce_back_rate: Option<u8>,
    pub q_score: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub lifter_id: String,
    pub lifter_name: Option<String>,
    pub federation: Federation,
    pub results_used: u32,
    pub results_skipped: u32,
    pub metrics: AthleteMetrics,
    pub population: String,
    pub population_fallback: bool,
    pub percentiles: MetricPercentiles,
}

pub async fn profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ProfileParams>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let federation = super::parse_federation(params.federation.as_deref())?;
    let lifter = LifterId::from(id.as_str());

    let rows = state.store.fetch_athlete_results(&lifter, federation).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound(format!("no results for athlete {id}")));
    }

    let lifter_name = rows.iter().find_map(|r| r.lifter_name.clone());
    let (results, report) = parse_rows(&rows);

    let metrics = calculate::extract_metrics(&results)
        .ok_or_else(|| ApiError::NotFound(format!("no parseable results for athlete {id}")))?;

    // Rank against the athlete's own demographic, taken from their most
    // recent parseable result.
    let latest = results.iter().max_by_key(|r| r.date);
    let filter = DemographicFilter {
        gender: latest.and_then(|r| r.gender),
        age_category: latest.and_then(|r| r.age_category.clone()),
        competition_level: None,
        federation,
    };
    let stats = state.sampler.population_stats(&filter).await;
    let percentiles = build_percentiles(&metrics, &stats);

    Ok(Json(ProfileResponse {
        lifter_id: id,
        lifter_name,
        federation,
        results_used: report.parsed as u32,
        results_skipped: report.skipped_rows as u32,
        metrics,
        population: stats.demographic.clone(),
        population_fallback: stats.is_fallback(),
        percentiles,
    }))
}

fn build_percentiles(metrics: &AthleteMetrics, stats: &PopulationStats) -> MetricPercentiles {
    let rank = |value: Option<f64>, metric: &PopulationMetric| -> Option<u8> {
        let value = value?;
        match percentile_rank(value, &metric.distribution) {
            0 => None,
            p => Some(p),
        }
    };

    MetricPercentiles {
        success_rate: rank(metrics.success.overall, &stats.success_rate),
        snatch_success_rate: rank(metrics.success.snatch, &stats.snatch_success_rate),
        clean_jerk_success_rate: rank(metrics.success.clean_jerk, &stats.clean_jerk_success_rate),
        consistency_score: rank(Some(metrics.consistency.score), &stats.consistency_score),
        clutch_rate: rank(metrics.clutch_rate, &stats.clutch_rate),
        snatch_bounce_back_rate: rank(metrics.bounce_back.snatch, &stats.snatch_bounce_back_rate),
        clean_jerk_bounce_back_rate: rank(
            metrics.bounce_back.clean_jerk,
            &stats.clean_jerk_bounce_back_rate,
        ),
        q_score: rank(metrics.q_score.best, &stats.q_score),
    }
}
