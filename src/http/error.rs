//! Errors that cross into HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::routing::SelectionError;
use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown simulationId")]
    UnknownTask,

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::UnknownTask => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "unknown simulationId" }),
            ),
            ApiError::Selection(SelectionError::NoHealthyTarget { tried }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "no healthy models", "tried": tried }),
            ),
            ApiError::Upstream(e) => (
                e.status(),
                json!({ "error": "initiate_failed", "details": e.details() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
