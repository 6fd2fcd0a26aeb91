//! Request handlers.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::health::HealthSummary;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::{InitiateMetadata, InitiateRequest};

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    #[serde(rename = "simulationId", default)]
    pub simulation_id: Option<String>,
}

/// Record of one started session, returned to the caller and logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartEvent {
    #[serde(rename = "simulationId")]
    pub simulation_id: String,
    #[serde(rename = "requestedModel")]
    pub requested_model: String,
    #[serde(rename = "usedModel")]
    pub used_model: String,
    #[serde(rename = "wasFallback")]
    pub was_fallback: bool,
    pub provider: Option<String>,
    pub latency_ms: Option<serde_json::Value>,
    pub ok: bool,
    pub initial_message: Option<String>,
    pub at: u64,
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthSummary> {
    let start_time = Instant::now();
    let table = state.table.load();
    let summary = state.registry.summary(table.targets());
    metrics::record_request("/health", StatusCode::OK.as_u16(), start_time);
    Json(summary)
}

/// POST /health/probe
pub async fn probe_now(State(state): State<AppState>) -> Json<HealthSummary> {
    let start_time = Instant::now();
    let table = state.table.load_full();
    state.registry.probe_all(table.targets()).await;
    let summary = state.registry.summary(table.targets());
    metrics::record_request("/health/probe", StatusCode::OK.as_u16(), start_time);
    Json(summary)
}

/// POST /interviews/start
pub async fn start_interview(State(state): State<AppState>, body: Bytes) -> Response {
    let start_time = Instant::now();

    // An empty or unparsable body is reported like an unknown id.
    let request: StartRequest = serde_json::from_slice(&body).unwrap_or_default();

    let response = match start(&state, request).await {
        Ok(event) => Json(event).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Start request rejected");
            e.into_response()
        }
    };

    metrics::record_request("/interviews/start", response.status().as_u16(), start_time);
    response
}

async fn start(state: &AppState, request: StartRequest) -> Result<StartEvent, ApiError> {
    let simulation_id = request.simulation_id.ok_or(ApiError::UnknownTask)?;
    let task = state
        .table
        .load()
        .lookup(&simulation_id)
        .cloned()
        .ok_or(ApiError::UnknownTask)?;

    let selection = state.selector.select(&task.route).await?;

    let reply = state
        .initiator
        .initiate(&InitiateRequest {
            model: selection.target.clone(),
            prompt: task.prompt.clone(),
            metadata: InitiateMetadata {
                simulation_id: simulation_id.clone(),
            },
        })
        .await
        .inspect_err(|e| {
            tracing::warn!(model = %selection.target, status = %e.status(), error = %e, "Initiate failed");
        })?;

    let event = StartEvent {
        simulation_id,
        requested_model: task.route.primary.clone(),
        used_model: selection.target,
        was_fallback: selection.was_fallback,
        provider: reply.provider,
        latency_ms: reply.latency_ms,
        ok: reply.ok,
        initial_message: reply.initial_message,
        at: state.registry.now_ms(),
    };

    tracing::info!(
        simulation_id = %event.simulation_id,
        requested_model = %event.requested_model,
        used_model = %event.used_model,
        was_fallback = event.was_fallback,
        provider = ?event.provider,
        ok = event.ok,
        "interview.start"
    );

    Ok(event)
}
