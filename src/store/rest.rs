//! PostgREST-backed result store.
//!
//! Queries the federation results tables over HTTP using PostgREST filter
//! conventions (`gender=eq.M`, `order=date.desc`). Counts are taken from
//! the `Content-Range` header with `Prefer: count=exact` so no rows have
//! to cross the wire.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use super::{ResultStore, StoreError};
use crate::config::StoreConfig;
use crate::models::{DemographicFilter, Federation, LifterId, RawResultRow};

pub struct RestResultStore {
    client: Client,
    base_url: Url,
    usaw_table: String,
    iwf_table: String,
}

impl RestResultStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&config.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", config.api_key)) {
            headers.insert("authorization", bearer);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            usaw_table: config.usaw_table.clone(),
            iwf_table: config.iwf_table.clone(),
        })
    }

    fn table(&self, federation: Federation) -> &str {
        match federation {
            Federation::Usaw => &self.usaw_table,
            Federation::Iwf => &self.iwf_table,
        }
    }

    fn table_url(&self, federation: Federation) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("rest/v1/{}", self.table(federation)))
            .map_err(|e| StoreError::BadRequest(format!("bad table url: {e}")))
    }

    fn filter_params(filter: &DemographicFilter) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(gender) = filter.gender {
            params.push(("gender".into(), format!("eq.{}", gender.as_str())));
        }
        if let Some(category) = &filter.age_category {
            params.push(("age_category".into(), format!("eq.{category}")));
        }
        if let Some(level) = &filter.competition_level {
            params.push(("level".into(), format!("eq.{level}")));
        }
        // Population queries only want complete scoresheets; partial rows
        // would inflate the count and crowd out complete rows at dedup.
        params.push(("total".into(), "not.is.null".into()));
        params.push(("best_snatch".into(), "not.is.null".into()));
        params.push(("best_cj".into(), "not.is.null".into()));
        params
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST {
            // PostgREST reports a missing column as code 42703.
            if body.contains("42703") || body.contains("does not exist") {
                return Err(StoreError::UnknownColumn(body));
            }
            return Err(StoreError::BadRequest(body));
        }

        Err(StoreError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }

    /// Parse the total from a `Content-Range` header like `0-24/3117`.
    fn parse_content_range(value: &str) -> Option<u64> {
        value.rsplit('/').next()?.trim().parse().ok()
    }
}

#[async_trait::async_trait]
impl ResultStore for RestResultStore {
    async fn count_results(&self, filter: &DemographicFilter) -> Result<u64, StoreError> {
        let url = self.table_url(filter.federation)?;
        let mut params = Self::filter_params(filter);
        params.push(("select".into(), "lifter_id".into()));
        params.push(("limit".into(), "1".into()));

        debug!(table = self.table(filter.federation), "counting results");
        let response = self
            .client
            .get(url)
            .query(&params)
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse_content_range)
            .ok_or(StoreError::MissingCount)
    }

    async fn fetch_results(
        &self,
        filter: &DemographicFilter,
        limit: Option<u32>,
    ) -> Result<Vec<RawResultRow>, StoreError> {
        let url = self.table_url(filter.federation)?;
        let mut params = Self::filter_params(filter);
        params.push(("order".into(), "date.desc".into()));
        if let Some(limit) = limit {
            params.push(("limit".into(), limit.to_string()));
        }

        debug!(
            table = self.table(filter.federation),
            ?limit,
            "fetching results"
        );
        let response = self.client.get(url).query(&params).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_athlete_results(
        &self,
        lifter: &LifterId,
        federation: Federation,
    ) -> Result<Vec<RawResultRow>, StoreError> {
        let url = self.table_url(federation)?;
        let params = [
            ("lifter_id".to_string(), format!("eq.{}", lifter.as_str())),
            ("order".to_string(), "date.desc".to_string()),
        ];

        debug!(lifter = lifter.as_str(), "fetching athlete results");
        let response = self.client.get(url).query(&params).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }
}
