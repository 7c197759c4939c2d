//! Observability infrastructure for the edge storefront platform.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with request context
//! - `RequestMetrics` - Per-request timing summary

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

// Re-export RequestId and TimingContext from edge-core for convenience
pub use edge_core::{RequestId, TimingContext};
