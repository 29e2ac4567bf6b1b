use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{DemographicFilter, Gender, PopulationMetric, PopulationStats};
use crate::rank::{percentile_label, percentile_rank, PerformanceLevel};

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub gender: Option<String>,
    pub age_category: Option<String>,
    pub level: Option<String>,
    pub federation: Option<String>,
    /// Metric name to rank `value` against, e.g. `success_rate`.
    pub metric: Option<String>,
    pub value: Option<f64>,
}

/// Percentile fields are absent when the population has no distribution
/// to rank against.
#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub metric: String,
    pub value: f64,
    pub percentile: Option<u8>,
    pub label: Option<String>,
    pub level: Option<PerformanceLevel>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: PopulationStats,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<RankResponse>,
}

pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse>, ApiError> {
    let filter = build_filter(&params)?;
    let stats = state.sampler.population_stats(&filter).await;

    let rank = match (&params.metric, params.value) {
        (Some(metric), Some(value)) => Some(rank_against(&stats, metric, value)?),
        (Some(_), None) | (None, Some(_)) => {
            return Err(ApiError::BadRequest(
                "ranking needs both metric and value".to_string(),
            ));
        }
        (None, None) => None,
    };

    let fallback = stats.is_fallback();
    Ok(Json(StatsResponse {
        stats,
        fallback,
        rank,
    }))
}

fn build_filter(params: &StatsParams) -> Result<DemographicFilter, ApiError> {
    let gender = match params.gender.as_deref() {
        None => None,
        Some(raw) => Some(
            Gender::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown gender: {raw}")))?,
        ),
    };

    Ok(DemographicFilter {
        gender,
        age_category: params.age_category.clone(),
        competition_level: params.level.clone(),
        federation: super::parse_federation(params.federation.as_deref())?,
    })
}

fn rank_against(
    stats: &PopulationStats,
    metric: &str,
    value: f64,
) -> Result<RankResponse, ApiError> {
    let target: &PopulationMetric = match metric {
        "success_rate" => &stats.success_rate,
        "snatch_success_rate" => &stats.snatch_success_rate,
        "clean_jerk_success_rate" => &stats.clean_jerk_success_rate,
        "consistency_score" => &stats.consistency_score,
        "clutch_rate" => &stats.clutch_rate,
        "bounce_back_rate" => &stats.bounce_back_rate,
        "snatch_bounce_back_rate" => &stats.snatch_bounce_back_rate,
        "clean_jerk_bounce_back_rate" => &stats.clean_jerk_bounce_back_rate,
        "competition_frequency" => &stats.competition_frequency,
        "q_score" => &stats.q_score,
        other => {
            return Err(ApiError::BadRequest(format!("unknown metric: {other}")));
        }
    };

    let percentile = match percentile_rank(value, &target.distribution) {
        0 => None,
        p => Some(p),
    };
    Ok(RankResponse {
        metric: metric.to_string(),
        value,
        percentile,
        label: percentile.map(percentile_label),
        level: percentile.map(PerformanceLevel::from_percentile),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::models::RawResultRow;
    use crate::sample::{PopulationSampler, SamplerSettings};
    use crate::store::MockResultStore;

    fn state_with(rows: Vec<RawResultRow>) -> AppState {
        let store: Arc<MockResultStore> = Arc::new(MockResultStore::with_rows(rows));
        let sampler = PopulationSampler::new(store.clone(), SamplerSettings::default());
        AppState::new(store, sampler)
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn row(lifter: &str) -> RawResultRow {
        RawResultRow {
            lifter_id: Some(lifter.to_string()),
            date: Some("2024-06-01".to_string()),
            snatch_lift_1: Some("90".to_string()),
            snatch_lift_2: Some("-95".to_string()),
            cj_lift_1: Some("110".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_stats_empty_population_is_fallback() {
        let app = build_router(state_with(vec![]));
        let (status, json) = get_json(app, "/api/population/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fallback"], true);
        assert_eq!(json["stats"]["success_rate"]["mean"], 75.0);
        assert_eq!(json["stats"]["demographic"], "athletes");
    }

    #[tokio::test]
    async fn test_stats_with_rows() {
        let app = build_router(state_with(vec![row("1"), row("2"), row("3")]));
        let (status, json) = get_json(app, "/api/population/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fallback"], false);
        assert_eq!(json["stats"]["success_rate"]["sample_size"], 3);
        assert_eq!(json["stats"]["success_rate"]["confidence"], "low");
    }

    #[tokio::test]
    async fn test_stats_with_rank() {
        let app = build_router(state_with(vec![row("1"), row("2"), row("3")]));
        let (status, json) = get_json(
            app,
            "/api/population/stats?metric=success_rate&value=99",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["rank"]["percentile"], 99);
        assert_eq!(json["rank"]["label"], "99th percentile");
        assert_eq!(json["rank"]["level"], "elite");
    }

    #[tokio::test]
    async fn test_rank_against_empty_distribution_is_absent() {
        // Fallback stats have no distributions; there is no 0th percentile.
        let app = build_router(state_with(vec![]));
        let (status, json) =
            get_json(app, "/api/population/stats?metric=success_rate&value=80").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fallback"], true);
        assert!(json["rank"]["percentile"].is_null());
        assert!(json["rank"]["label"].is_null());
        assert!(json["rank"]["level"].is_null());
    }

    #[tokio::test]
    async fn test_stats_rank_needs_both_params() {
        let app = build_router(state_with(vec![row("1")]));
        let (status, _) = get_json(app, "/api/population/stats?metric=success_rate").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_unknown_metric() {
        let app = build_router(state_with(vec![row("1")]));
        let (status, json) =
            get_json(app, "/api/population/stats?metric=sinclair&value=300").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_stats_bad_gender() {
        let app = build_router(state_with(vec![row("1")]));
        let (status, _) = get_json(app, "/api/population/stats?gender=X").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_demographic_description() {
        let app = build_router(state_with(vec![]));
        let (_, json) = get_json(
            app,
            "/api/population/stats?gender=F&age_category=Junior&level=National",
        )
        .await;

        assert_eq!(
            json["stats"]["demographic"],
            "female athletes in Junior at National level"
        );
    }
}
