//! Out-of-band health probes.
//!
//! # Responsibilities
//! - Ask the downstream service how a single target is doing
//! - Turn its answer into a `ProbeReport`, or a `ProbeError` describing why not
//!
//! # Design Decisions
//! - The prober never touches the registry; the registry folds outcomes into snapshots
//! - Non-success statuses count as failures, like any transport error
//! - A payload without a numeric latency is a valid report that can never be healthy

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_PROBE_BODY: usize = 64 * 1024;

/// What a target reported about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub ok: bool,
    pub latency_ms: Option<u64>,
    pub provider: Option<String>,
}

impl ProbeReport {
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            ok: true,
            latency_ms: Some(latency_ms),
            provider: None,
        }
    }

    pub fn down(latency_ms: Option<u64>) -> Self {
        Self {
            ok: false,
            latency_ms,
            provider: None,
        }
    }
}

/// Why a probe produced no report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("probe endpoint returned status {0}")]
    Status(u16),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed probe response: {0}")]
    Malformed(String),
}

/// Performs a single health check against one target.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &str) -> Result<ProbeReport, ProbeError>;
}

/// Prober backed by the downstream `GET {base}/probe?model=<target>` endpoint.
#[derive(Clone)]
pub struct HttpProber {
    client: Client<HttpConnector, Body>,
    probe_url: Url,
}

impl HttpProber {
    pub fn new(base_url: &str, probe_path: &str) -> Result<Self, url::ParseError> {
        let probe_url = Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), probe_path))?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self { client, probe_url })
    }

    /// The URL probed for `target`.
    pub fn url_for(&self, target: &str) -> Url {
        let mut url = self.probe_url.clone();
        url.query_pairs_mut().append_pair("model", target);
        url
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &str) -> Result<ProbeReport, ProbeError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.url_for(target).as_str())
            .header(header::USER_AGENT, "model-router-health-check")
            .body(Body::empty())
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_PROBE_BODY)
            .await
            .map_err(|e| ProbeError::Malformed(e.to_string()))?;

        parse_probe_payload(&bytes)
    }
}

#[derive(Deserialize)]
struct ProbePayload {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    latency_ms: Option<serde_json::Value>,
    #[serde(default)]
    provider: Option<String>,
}

/// Decode a probe response body.
pub fn parse_probe_payload(bytes: &[u8]) -> Result<ProbeReport, ProbeError> {
    let payload: ProbePayload =
        serde_json::from_slice(bytes).map_err(|e| ProbeError::Malformed(e.to_string()))?;

    let latency_ms = payload
        .latency_ms
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|l| l.is_finite() && *l >= 0.0)
        .map(|l| l.round() as u64);

    Ok(ProbeReport {
        ok: payload.ok,
        latency_ms,
        provider: payload.provider,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_healthy_payload() {
        let report = parse_probe_payload(
            br#"{"ok": true, "latency_ms": 742, "provider": "openai", "model": "gpt-4o"}"#,
        )
        .unwrap();
        assert_eq!(
            report,
            ProbeReport { ok: true, latency_ms: Some(742), provider: Some("openai".into()) }
        );
    }

    #[test]
    fn test_fractional_latency_is_rounded() {
        let report = parse_probe_payload(br#"{"ok": true, "latency_ms": 99.6}"#).unwrap();
        assert_eq!(report.latency_ms, Some(100));
    }

    #[test]
    fn test_non_numeric_latency_is_dropped() {
        let report = parse_probe_payload(br#"{"ok": true, "latency_ms": "slow"}"#).unwrap();
        assert!(report.ok);
        assert_eq!(report.latency_ms, None);

        let report = parse_probe_payload(br#"{"ok": true, "latency_ms": -5}"#).unwrap();
        assert_eq!(report.latency_ms, None);
    }

    #[test]
    fn test_missing_ok_reads_as_down() {
        let report = parse_probe_payload(br#"{"latency_ms": 10}"#).unwrap();
        assert!(!report.ok);
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(parse_probe_payload(b"<html>"), Err(ProbeError::Malformed(_))));
        assert!(matches!(
            parse_probe_payload(br#"{"ok": "yes"}"#),
            Err(ProbeError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_url() {
        let prober = HttpProber::new("http://localhost:8001/", "/probe").unwrap();
        assert_eq!(
            prober.url_for("claude-3-5-sonnet").as_str(),
            "http://localhost:8001/probe?model=claude-3-5-sonnet"
        );
    }
}
