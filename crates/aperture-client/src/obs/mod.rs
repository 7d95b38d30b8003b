//! In-process client metrics.
//!
//! Counters for flows, decisions, and fail-open events plus a check latency
//! histogram, rendered in Prometheus text format by whoever embeds the client.

pub mod metrics;

pub use metrics::ClientMetrics;
