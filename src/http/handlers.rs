//! Endpoint handlers.
//!
//! Handlers only translate between HTTP and the analytics service; every
//! decision (admission, caching, fallbacks) lives in the service.

use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::analytics::{HealthReport, Metric};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::ClientId;

/// Query parameters of the summary endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryQuery {
    #[serde(rename = "type")]
    pub metric_type: String,
    pub period: String,
}

/// `POST /api/metrics`
pub async fn create_metric(
    State(state): State<AppState>,
    client: ClientId,
    Json(metric): Json<Metric>,
) -> Response {
    let start = Instant::now();
    let response = match state.service.ingest(&client, metric).await {
        Ok(ack) => (StatusCode::CREATED, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request("ingest", response.status().as_u16(), start);
    response
}

/// `GET /api/metrics/summary?type=..&period=..`
pub async fn get_summary(
    State(state): State<AppState>,
    client: ClientId,
    Query(query): Query<SummaryQuery>,
) -> Response {
    let start = Instant::now();
    let response = match state
        .service
        .summarize(&client, &query.metric_type, &query.period)
        .await
    {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request("summary", response.status().as_u16(), start);
    response
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.service.health().await)
}
