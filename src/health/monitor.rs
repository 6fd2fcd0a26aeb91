//! Periodic health sweep.
//!
//! # Responsibilities
//! - Probe the configured target set on a fixed interval
//! - Run the first sweep immediately so routing starts with data

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::registry::HealthRegistry;
use crate::routing::RoutingTable;

pub struct HealthMonitor {
    registry: Arc<HealthRegistry>,
    table: Arc<ArcSwap<RoutingTable>>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<HealthRegistry>,
        table: Arc<ArcSwap<RoutingTable>>,
        config: HealthCheckConfig,
    ) -> Self {
        Self {
            registry,
            table,
            config,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Periodic health checks disabled");
            return;
        }

        tracing::info!(
            interval_ms = self.config.interval_ms,
            max_ok_ms = self.config.max_ok_ms,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_millis(self.config.interval_ms));
        // A sweep that overruns should not be followed by a burst of catch-up sweeps.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every target in the current routing table once.
    pub async fn sweep(&self) {
        let table = self.table.load_full();
        let results = self.registry.probe_all(table.targets()).await;
        let healthy = results.iter().filter(|s| s.ok).count();

        tracing::debug!(
            targets = results.len(),
            healthy,
            "Health sweep complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::clock::ManualClock;
    use crate::health::prober::ProbeReport;
    use crate::health::testing::ScriptedProber;

    fn setup(enabled: bool) -> (Arc<ScriptedProber>, Arc<HealthRegistry>, HealthMonitor) {
        let prober = Arc::new(ScriptedProber::new());
        prober.respond("m1", Ok(ProbeReport::healthy(10)));
        prober.respond("m2", Ok(ProbeReport::down(None)));

        let registry = Arc::new(HealthRegistry::new(
            prober.clone(),
            Arc::new(ManualClock::new(1)),
            3000,
            Duration::from_millis(100),
        ));
        let table = Arc::new(ArcSwap::from_pointee(RoutingTable::new(
            vec!["m1".into(), "m2".into()],
            Vec::new(),
        )));
        let config = HealthCheckConfig {
            enabled,
            interval_ms: 20,
            ..HealthCheckConfig::default()
        };
        let monitor = HealthMonitor::new(registry.clone(), table, config);
        (prober, registry, monitor)
    }

    #[tokio::test]
    async fn test_first_sweep_is_immediate_and_repeats() {
        let (prober, registry, monitor) = setup(true);
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(monitor.run(rx));
        tokio::time::sleep(Duration::from_millis(70)).await;

        assert!(registry.get("m1").ok);
        assert!(!registry.get("m2").ok);
        assert_eq!(registry.get("m2").last_checked, Some(1));
        assert!(prober.calls() >= 4, "expected repeated sweeps, got {}", prober.calls());

        tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_monitor_exits() {
        let (prober, _registry, monitor) = setup(false);
        let (_tx, rx) = broadcast::channel(1);

        monitor.run(rx).await;
        assert_eq!(prober.calls(), 0);
    }
}
