//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Own the registry, selector, and initiator shared by handlers
//! - Spawn the health monitor and the routing-table reload loop
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{config_warnings, RouterConfig};
use crate::health::{Clock, HealthMonitor, HealthRegistry, HttpProber, Prober, SystemClock};
use crate::http::handlers;
use crate::http::request::{request_span, MakeRequestUuidV4};
use crate::routing::{RoutingTable, Selector};
use crate::upstream::Initiator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HealthRegistry>,
    pub selector: Arc<Selector>,
    pub initiator: Arc<Initiator>,
    pub table: Arc<ArcSwap<RoutingTable>>,
}

/// HTTP server for the model router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server that probes the configured upstream over HTTP.
    pub fn new(config: RouterConfig) -> Result<Self, url::ParseError> {
        let prober = HttpProber::new(&config.upstream.base_url, &config.health_check.probe_path)?;
        Self::with_prober(config, Arc::new(prober), Arc::new(SystemClock))
    }

    /// Create a server with an explicit prober and clock.
    pub fn with_prober(
        config: RouterConfig,
        prober: Arc<dyn Prober>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, url::ParseError> {
        let registry = Arc::new(HealthRegistry::from_config(&config.health_check, prober, clock));
        let selector = Arc::new(Selector::new(
            registry.clone(),
            Duration::from_millis(config.health_check.stale_after_ms),
        ));
        let initiator = Arc::new(Initiator::new(
            &config.upstream.base_url,
            Duration::from_secs(config.upstream.request_timeout_secs),
        )?);
        let table = Arc::new(ArcSwap::from_pointee(RoutingTable::from_config(&config)));

        let state = AppState {
            registry,
            selector,
            initiator,
            table,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::get_health))
            .route("/health/probe", post(handlers::probe_now))
            .route("/interviews/start", post(handlers::start_interview))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tasks = self.state.table.load().task_count(),
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(
            self.state.registry.clone(),
            self.state.table.clone(),
            self.config.health_check.clone(),
        );
        tokio::spawn(monitor.run(shutdown.resubscribe()));

        tokio::spawn(apply_config_updates(
            self.state.table.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Shared state, e.g. for inspecting the registry.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Swap in the routing table of every validated config that arrives.
async fn apply_config_updates(
    table: Arc<ArcSwap<RoutingTable>>,
    mut updates: mpsc::UnboundedReceiver<RouterConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => {
                    for warning in config_warnings(&config) {
                        tracing::warn!(%warning, "Configuration warning");
                    }
                    let next = RoutingTable::from_config(&config);
                    tracing::info!(
                        tasks = next.task_count(),
                        targets = next.targets().len(),
                        "Routing table reloaded"
                    );
                    table.store(Arc::new(next));
                }
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use crate::health::testing::ScriptedProber;
    use crate::health::{ManualClock, ProbeReport};
    use crate::routing::RoutingSpec;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server(prober: Arc<ScriptedProber>) -> HttpServer {
        let mut config = RouterConfig::default();
        config.targets = vec!["m1".into(), "m2".into()];
        config.tasks.push(TaskConfig {
            id: "sim".into(),
            prompt: String::new(),
            route: RoutingSpec::new("m1", vec!["m2".into()]),
        });
        HttpServer::with_prober(config, prober, Arc::new(ManualClock::new(500))).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_route_reads_registry() {
        let server = server(Arc::new(ScriptedProber::new()));
        server.state().registry.set("m1", true, Some(40));

        let response = server
            .router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = json_body(response).await;
        assert_eq!(
            body,
            serde_json::json!({
                "models": {
                    "m1": { "ok": true, "latency_ms": 40, "last_checked": 500 },
                    "m2": { "ok": false, "latency_ms": null, "last_checked": null }
                },
                "max_ok_ms": 3000,
                "checked_at": 500
            })
        );
    }

    #[tokio::test]
    async fn test_probe_route_uses_prober() {
        let prober = Arc::new(ScriptedProber::new());
        prober.respond("m1", Ok(ProbeReport::healthy(12)));
        let server = server(prober.clone());

        let response = server
            .router
            .clone()
            .oneshot(Request::post("/health/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["models"]["m1"]["ok"], true);
        assert_eq!(body["models"]["m2"]["ok"], false);
        assert_eq!(prober.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_healthy_target_is_503_before_initiate() {
        let server = server(Arc::new(ScriptedProber::new()));

        let response = server
            .router
            .clone()
            .oneshot(
                Request::post("/interviews/start")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"simulationId":"sim"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["tried"], serde_json::json!(["m1", "m2"]));
    }

    #[tokio::test]
    async fn test_reload_swaps_table() {
        let table = Arc::new(ArcSwap::from_pointee(RoutingTable::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let mut config = RouterConfig::default();
        config.tasks.push(TaskConfig {
            id: "demo".into(),
            prompt: String::new(),
            route: RoutingSpec::new("gpt-4o", Vec::new()),
        });
        tx.send(config).unwrap();
        drop(tx);

        apply_config_updates(table.clone(), rx, shutdown_rx).await;

        let current = table.load();
        assert!(current.lookup("demo").is_some());
        assert_eq!(current.targets().len(), 3);
    }
}
