//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dashmap::DashMap;
use model_router::config::{RouterConfig, TaskConfig};
use model_router::lifecycle::Shutdown;
use model_router::routing::RoutingSpec;
use model_router::HttpServer;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A programmable stand-in for the downstream agent service.
#[derive(Clone, Default)]
pub struct MockUpstream {
    inner: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    down: DashMap<String, bool>,
    latency: DashMap<String, u64>,
    initiate_status: AtomicU16,
    probes: AtomicUsize,
    initiated: Mutex<Vec<String>>,
}

#[derive(Deserialize)]
struct ProbeQuery {
    model: String,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, model: &str, down: bool) {
        self.inner.down.insert(model.to_string(), down);
    }

    pub fn set_latency(&self, model: &str, latency_ms: u64) {
        self.inner.latency.insert(model.to_string(), latency_ms);
    }

    /// Make `/initiate` answer with `status` instead of 200.
    pub fn fail_initiate(&self, status: u16) {
        self.inner.initiate_status.store(status, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn probe_count(&self) -> usize {
        self.inner.probes.load(Ordering::SeqCst)
    }

    pub fn initiated(&self) -> Vec<String> {
        self.inner.initiated.lock().unwrap().clone()
    }

    /// Serve on an ephemeral port and return its address.
    pub async fn start(&self) -> SocketAddr {
        let app = Router::new()
            .route("/probe", get(probe))
            .route("/initiate", post(initiate))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }
}

async fn probe(State(mock): State<MockUpstream>, Query(q): Query<ProbeQuery>) -> Json<Value> {
    mock.inner.probes.fetch_add(1, Ordering::SeqCst);
    let down = mock.inner.down.get(&q.model).map(|d| *d).unwrap_or(false);
    let latency = mock.inner.latency.get(&q.model).map(|l| *l).unwrap_or(100);

    Json(json!({
        "ok": !down,
        "latency_ms": latency,
        "provider": "mock",
        "model": q.model,
    }))
}

async fn initiate(State(mock): State<MockUpstream>, Json(body): Json<Value>) -> Response {
    let status = mock.inner.initiate_status.load(Ordering::SeqCst);
    if status != 0 {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, Json(json!({ "detail": "provider unavailable" }))).into_response();
    }

    let model = body["model"].as_str().unwrap_or_default().to_string();
    mock.inner.initiated.lock().unwrap().push(model.clone());

    Json(json!({
        "ok": true,
        "latency_ms": 321,
        "provider": "mock",
        "model": model,
        "initial_message": format!("hello from {}", model),
    }))
    .into_response()
}

/// Router config pointing at `upstream`, with the periodic sweep off.
pub fn router_config(upstream: SocketAddr, targets: &[&str], tasks: Vec<TaskConfig>) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.upstream.base_url = format!("http://{}", upstream);
    config.targets = targets.iter().map(|t| t.to_string()).collect();
    config.tasks = tasks;
    config.health_check.enabled = false;
    config.health_check.probe_timeout_ms = 2_000;
    config
}

pub fn task(id: &str, primary: &str, fallbacks: &[&str]) -> TaskConfig {
    TaskConfig {
        id: id.to_string(),
        prompt: format!("prompt for {}", id),
        route: RoutingSpec::new(primary, fallbacks.iter().map(|f| f.to_string()).collect()),
    }
}

/// Start the router on an ephemeral port.
pub async fn start_router(config: RouterConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
