//! Health registry.
//!
//! # Responsibilities
//! - Hold the latest snapshot per target
//! - Probe targets (singly or fanned out) and record the outcome
//! - Pick the first healthy candidate in priority order
//!
//! # Design Decisions
//! - `DashMap` gives per-key atomic replacement; the periodic sweep and inline
//!   refreshes write concurrently, last write wins per target
//! - Probe failures are absorbed here and never reach callers
//! - Every probe is bounded by `probe_timeout`

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::clock::Clock;
use crate::health::prober::{ProbeError, Prober};
use crate::health::snapshot::HealthSnapshot;
use crate::observability::metrics;

/// Outcome of a successful pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub target: String,
    pub was_fallback: bool,
    pub snapshot: HealthSnapshot,
}

/// Point-in-time view of a target set, for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
    pub models: BTreeMap<String, HealthSnapshot>,
    pub max_ok_ms: u64,
    pub checked_at: u64,
}

/// Per-target health state shared by the monitor and the request path.
pub struct HealthRegistry {
    snapshots: DashMap<String, HealthSnapshot>,
    prober: Arc<dyn Prober>,
    clock: Arc<dyn Clock>,
    max_ok_ms: u64,
    probe_timeout: Duration,
}

impl HealthRegistry {
    pub fn new(
        prober: Arc<dyn Prober>,
        clock: Arc<dyn Clock>,
        max_ok_ms: u64,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            snapshots: DashMap::new(),
            prober,
            clock,
            max_ok_ms,
            probe_timeout,
        }
    }

    pub fn from_config(
        config: &HealthCheckConfig,
        prober: Arc<dyn Prober>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            prober,
            clock,
            config.max_ok_ms,
            Duration::from_millis(config.probe_timeout_ms),
        )
    }

    /// Latency ceiling in milliseconds (inclusive).
    pub fn max_ok_ms(&self) -> u64 {
        self.max_ok_ms
    }

    /// Current time according to the injected clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Latest snapshot for `target`; the unknown snapshot if never written.
    pub fn get(&self, target: &str) -> HealthSnapshot {
        self.snapshots
            .get(target)
            .map(|entry| *entry.value())
            .unwrap_or(HealthSnapshot::UNKNOWN)
    }

    /// Replace the entry for `target`, stamped with the current time.
    pub fn set(&self, target: &str, ok: bool, latency_ms: Option<u64>) -> HealthSnapshot {
        let snapshot = HealthSnapshot::normalized(ok, latency_ms, self.max_ok_ms, self.clock.now_ms());
        self.snapshots.insert(target.to_string(), snapshot);
        snapshot
    }

    /// First candidate (primary, then fallbacks in order) whose snapshot is healthy.
    pub fn pick_healthy(&self, primary: &str, fallbacks: &[String]) -> Option<Selection> {
        std::iter::once(primary)
            .chain(fallbacks.iter().map(String::as_str))
            .find_map(|target| {
                let snapshot = self.get(target);
                snapshot.is_healthy(self.max_ok_ms).then(|| Selection {
                    target: target.to_string(),
                    was_fallback: target != primary,
                    snapshot,
                })
            })
    }

    /// Probe one target and record the result. Never fails.
    pub async fn probe_once(&self, target: &str) -> HealthSnapshot {
        let outcome = match time::timeout(self.probe_timeout, self.prober.probe(target)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.probe_timeout)),
        };

        let snapshot = match outcome {
            Ok(report) => {
                tracing::debug!(
                    target_id = %target,
                    ok = report.ok,
                    latency_ms = ?report.latency_ms,
                    provider = ?report.provider,
                    "Probe completed"
                );
                self.set(target, report.ok, report.latency_ms)
            }
            Err(e) => {
                tracing::warn!(target_id = %target, error = %e, "Probe failed");
                self.set(target, false, None)
            }
        };

        metrics::record_probe(target, &snapshot);
        snapshot
    }

    /// Probe every target concurrently; results follow input order.
    pub async fn probe_all(&self, targets: &[String]) -> Vec<HealthSnapshot> {
        join_all(targets.iter().map(|target| self.probe_once(target))).await
    }

    /// Snapshot map for `targets` plus the ceiling and current time.
    pub fn summary(&self, targets: &[String]) -> HealthSummary {
        HealthSummary {
            models: targets
                .iter()
                .map(|target| (target.clone(), self.get(target)))
                .collect(),
            max_ok_ms: self.max_ok_ms,
            checked_at: self.clock.now_ms(),
        }
    }
}
