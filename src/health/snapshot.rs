//! Per-target health snapshot.
//!
//! # Design Decisions
//! - Snapshots are plain `Copy` values, replaced wholesale on every write
//! - `ok == true` implies a known latency within the ceiling; the registry
//!   normalizes on write so readers never see the invalid combination

use serde::{Deserialize, Serialize};

/// Last known health measurement for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Reachable and within the latency ceiling at the last probe.
    pub ok: bool,
    /// Round-trip time of the last probe in milliseconds.
    pub latency_ms: Option<u64>,
    /// Epoch milliseconds of the last write; `None` if never probed.
    pub last_checked: Option<u64>,
}

impl HealthSnapshot {
    /// The snapshot reported for unknown or never-probed targets.
    pub const UNKNOWN: HealthSnapshot = HealthSnapshot {
        ok: false,
        latency_ms: None,
        last_checked: None,
    };

    /// Build a snapshot, forcing `ok` to false when the latency is missing
    /// or above `max_ok_ms`.
    pub fn normalized(ok: bool, latency_ms: Option<u64>, max_ok_ms: u64, checked_at: u64) -> Self {
        let within_ceiling = matches!(latency_ms, Some(l) if l <= max_ok_ms);
        Self {
            ok: ok && within_ceiling,
            latency_ms,
            last_checked: Some(checked_at),
        }
    }

    /// Selection predicate: ok, latency known, latency within the inclusive ceiling.
    pub fn is_healthy(&self, max_ok_ms: u64) -> bool {
        self.ok && matches!(self.latency_ms, Some(l) if l <= max_ok_ms)
    }

    /// Milliseconds since the last write, or `None` if never probed.
    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.last_checked.map(|at| now_ms.saturating_sub(at))
    }
}
