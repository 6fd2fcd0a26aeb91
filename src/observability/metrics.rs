//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_probes_total` (counter): probes by target and outcome
//! - `router_target_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `router_probe_latency_ms` (histogram): reported probe latency
//! - `router_selections_total` (counter): selections by primary, outcome, refresh
//! - `router_requests_total` (counter): inbound requests by route and status
//! - `router_request_duration_seconds` (histogram): inbound latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which is what unit tests rely on

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::{HealthSnapshot, Selection};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(target: &str, snapshot: &HealthSnapshot) {
    let outcome = match (snapshot.ok, snapshot.latency_ms) {
        (true, _) => "healthy",
        (false, Some(_)) => "degraded",
        (false, None) => "failed",
    };

    counter!("router_probes_total", "target" => target.to_string(), "outcome" => outcome)
        .increment(1);
    gauge!("router_target_healthy", "target" => target.to_string())
        .set(if snapshot.ok { 1.0 } else { 0.0 });
    if let Some(latency) = snapshot.latency_ms {
        histogram!("router_probe_latency_ms", "target" => target.to_string()).record(latency as f64);
    }
}

pub fn record_selection(primary: &str, pick: Option<&Selection>, refreshed: bool) {
    let outcome = match pick {
        Some(p) if p.was_fallback => "fallback",
        Some(_) => "primary",
        None => "unavailable",
    };

    counter!(
        "router_selections_total",
        "primary" => primary.to_string(),
        "outcome" => outcome,
        "refreshed" => if refreshed { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!("router_requests_total", "route" => route, "status" => status.to_string()).increment(1);
    histogram!("router_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}
