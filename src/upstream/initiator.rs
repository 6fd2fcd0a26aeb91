//! Downstream session initiation.
//!
//! # Responsibilities
//! - POST the selected target, prompt, and task metadata to `{base}/initiate`
//! - Decode the downstream answer or classify why there is none
//!
//! # Design Decisions
//! - Single attempt: the router never retries the downstream call
//! - Error bodies are kept (as JSON when possible) so callers can relay them

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time;
use url::Url;

const MAX_RESPONSE_BODY: usize = 1024 * 1024;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InitiateMetadata {
    #[serde(rename = "simulationId")]
    pub simulation_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InitiateRequest {
    pub model: String,
    pub prompt: String,
    pub metadata: InitiateMetadata,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct InitiateResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub latency_ms: Option<serde_json::Value>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub initial_message: Option<String>,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("initiate returned status {status}")]
    Status {
        status: StatusCode,
        body: serde_json::Value,
    },

    #[error("initiate transport error: {0}")]
    Transport(String),

    #[error("initiate timed out after {0:?}")]
    Timeout(Duration),

    #[error("undecodable initiate response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Status relayed to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Status { status, .. } => *status,
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Transport(_) | UpstreamError::Decode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Diagnostic payload relayed to the caller.
    pub fn details(&self) -> serde_json::Value {
        match self {
            UpstreamError::Status { body, .. } => body.clone(),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

/// Client for the downstream `initiate` endpoint.
#[derive(Clone)]
pub struct Initiator {
    client: Client<HttpConnector, Body>,
    url: Url,
    timeout: Duration,
}

impl Initiator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, url::ParseError> {
        let url = Url::parse(&format!("{}/initiate", base_url.trim_end_matches('/')))?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub async fn initiate(&self, req: &InitiateRequest) -> Result<InitiateResponse, UpstreamError> {
        let body = serde_json::to_vec(req).map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.url.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        // The deadline covers the body as well as the headers.
        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;
            let status = response.status();
            let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BODY)
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;
            Ok::<_, UpstreamError>((status, bytes))
        };

        let (status, bytes) = time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))??;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            });
            return Err(UpstreamError::Status { status, body });
        }

        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
