pub mod athlete;
pub mod population;

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Parse an optional federation query value, defaulting to USAW.
pub(crate) fn parse_federation(
    raw: Option<&str>,
) -> Result<crate::models::Federation, super::ApiError> {
    use crate::models::Federation;
    match raw {
        None | Some("usaw") => Ok(Federation::Usaw),
        Some("iwf") => Ok(Federation::Iwf),
        Some(other) => Err(super::ApiError::BadRequest(format!(
            "unknown federation: {other}"
        ))),
    }
}
