//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic sweep (monitor.rs):
//!     Interval tick
//!     → registry.probe_all(targets)
//!
//! Inline refresh (routing::selector):
//!     Stale or missing pick
//!     → registry.probe_all(candidates)
//!
//! Both paths:
//!     prober.rs (one probe per target, bounded by a timeout)
//!     → snapshot.rs (normalized, stamped by clock.rs)
//!     → registry.rs (per-target replace)
//! ```
//!
//! # Design Decisions
//! - Health state is per-target; no cross-target coordination
//! - The registry is an owned instance, shared via Arc
//! - Time and probing are injected so tests control both

pub mod clock;
pub mod monitor;
pub mod prober;
pub mod registry;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use monitor::HealthMonitor;
pub use prober::{HttpProber, ProbeError, ProbeReport, Prober};
pub use registry::{HealthRegistry, HealthSummary, Selection};
pub use snapshot::HealthSnapshot;
