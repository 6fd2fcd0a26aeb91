//! Downstream orchestration service client.
//!
//! The router decides *which* target serves a task; this module performs the
//! one call that hands the task to the downstream service for that target.

pub mod initiator;

pub use initiator::{InitiateMetadata, InitiateRequest, InitiateResponse, Initiator, UpstreamError};
