//! Target selection with a staleness guard.
//!
//! # Algorithm
//! ```text
//! pick = registry.pick_healthy(primary, fallbacks)
//! if pick is none
//!    or (pick is the primary and its snapshot is older than stale_after):
//!     registry.probe_all([primary, ...fallbacks])
//!     pick = registry.pick_healthy(primary, fallbacks)
//! pick or NoHealthyTarget { tried }
//! ```
//!
//! # Design Decisions
//! - At most one refresh per call, never a loop
//! - A cached fallback pick is trusted; only the primary is age-checked
//! - A never-probed primary counts as infinitely stale

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::health::{HealthRegistry, Selection};
use crate::observability::metrics;
use crate::routing::RoutingSpec;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no healthy target among [{}]", .tried.join(", "))]
    NoHealthyTarget { tried: Vec<String> },
}

pub struct Selector {
    registry: Arc<HealthRegistry>,
    stale_after_ms: u64,
}

impl Selector {
    pub fn new(registry: Arc<HealthRegistry>, stale_after: Duration) -> Self {
        Self {
            registry,
            stale_after_ms: u64::try_from(stale_after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn registry(&self) -> &Arc<HealthRegistry> {
        &self.registry
    }

    /// Choose a target for `spec`, refreshing health at most once.
    pub async fn select(&self, spec: &RoutingSpec) -> Result<Selection, SelectionError> {
        let cached = self.registry.pick_healthy(&spec.primary, &spec.fallbacks);

        let refresh_reason = match &cached {
            None => Some("no healthy candidate"),
            Some(pick) if pick.target == spec.primary && self.is_stale(&spec.primary) => {
                Some("primary snapshot stale")
            }
            Some(_) => None,
        };

        let pick = match refresh_reason {
            None => cached,
            Some(reason) => {
                let candidates = spec.candidates();
                tracing::debug!(primary = %spec.primary, reason, "Refreshing candidate health");
                self.registry.probe_all(&candidates).await;
                self.registry.pick_healthy(&spec.primary, &spec.fallbacks)
            }
        };

        metrics::record_selection(&spec.primary, pick.as_ref(), refresh_reason.is_some());

        pick.ok_or_else(|| SelectionError::NoHealthyTarget {
            tried: spec.candidates(),
        })
    }

    fn is_stale(&self, target: &str) -> bool {
        let now = self.registry.now_ms();
        self.registry
            .get(target)
            .age_ms(now)
            .map_or(true, |age| age > self.stale_after_ms)
    }
}
