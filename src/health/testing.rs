//! Test doubles for the health subsystem.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::health::prober::{ProbeError, ProbeReport, Prober};

/// A prober that answers from a script and records every call.
#[derive(Default)]
pub struct ScriptedProber {
    responses: DashMap<String, Result<ProbeReport, ProbeError>>,
    delays: DashMap<String, Duration>,
    calls: AtomicUsize,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, target: &str, outcome: Result<ProbeReport, ProbeError>) {
        self.responses.insert(target.to_string(), outcome);
    }

    pub fn delay(&self, target: &str, by: Duration) {
        self.delays.insert(target.to_string(), by);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Targets probed so far, in call order.
    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &str) -> Result<ProbeReport, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.probed.lock().unwrap().push(target.to_string());

        let delay = self.delays.get(target).map(|d| *d.value());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(target)
            .map(|r| r.value().clone())
            .unwrap_or_else(|| Err(ProbeError::Transport(format!("no script for {}", target))))
    }
}
