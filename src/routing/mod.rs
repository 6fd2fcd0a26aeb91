//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (task id)
//!     → table.rs (task lookup → RoutingSpec)
//!     → selector.rs (pick from registry, refresh once if needed)
//!     → Return: Selection or NoHealthyTarget
//! ```
//!
//! # Design Decisions
//! - Priority order is authoritative: first healthy candidate wins
//! - No latency-based re-ranking among healthy candidates
//! - Table is swapped whole on reload, never mutated in place

pub mod selector;
pub mod table;

pub use selector::{SelectionError, Selector};
pub use table::{RoutingSpec, RoutingTable};
