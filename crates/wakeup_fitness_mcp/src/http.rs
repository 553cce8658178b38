//! Plain HTTP routes over [`FitnessService`].

use std::sync::Arc;

use axum::debug_handler;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use wakeup_fitness_client::observability::Health;

use crate::McpError;
use crate::services::FitnessService;
use crate::types::{
    AccessResult, DaysParams, RangeParams, SleepAverageResult, SleepTotalResult,
    StepsAverageResult, StepsTotalResult, SummaryResult,
};

pub struct AppState {
    pub service: FitnessService,
    /// `None` serves `/metrics` as 404.
    pub metrics: Option<PrometheusHandle>,
}

impl IntoResponse for McpError {
    fn into_response(self) -> Response {
        let status = match &self {
            McpError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            McpError::Validation(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Unwrap a query extraction, reporting a malformed query string as a validation error.
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, McpError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| McpError::Validation(rejection.body_text()))
}

#[debug_handler]
async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(state.service.health())
}

#[debug_handler]
async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[debug_handler]
async fn access(State(state): State<Arc<AppState>>) -> Json<AccessResult> {
    Json(state.service.access())
}

#[debug_handler]
async fn total_steps(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<StepsTotalResult>, McpError> {
    let params = query_params(query)?;
    state.service.total_steps(&params).await.map(Json)
}

#[debug_handler]
async fn total_sleep(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<SleepTotalResult>, McpError> {
    let params = query_params(query)?;
    state.service.total_sleep_hours(&params).await.map(Json)
}

#[debug_handler]
async fn average_steps(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DaysParams>, QueryRejection>,
) -> Result<Json<StepsAverageResult>, McpError> {
    let params = query_params(query)?;
    state.service.average_daily_steps(&params).await.map(Json)
}

#[debug_handler]
async fn average_sleep(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DaysParams>, QueryRejection>,
) -> Result<Json<SleepAverageResult>, McpError> {
    let params = query_params(query)?;
    state.service.average_sleep_hours(&params).await.map(Json)
}

#[debug_handler]
async fn summary(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DaysParams>, QueryRejection>,
) -> Result<Json<SummaryResult>, McpError> {
    let params = query_params(query)?;
    state.service.summary(&params).await.map(Json)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/fitness/access", get(access))
        .route("/fitness/steps/total", get(total_steps))
        .route("/fitness/sleep/total", get(total_sleep))
        .route("/fitness/steps/average", get(average_steps))
        .route("/fitness/sleep/average", get(average_sleep))
        .route("/fitness/summary", get(summary))
        .with_state(state)
}
