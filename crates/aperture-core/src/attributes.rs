//! Span attribute keys, header names, and SDK defaults.
//!
//! The keys are read by the agent's telemetry pipeline to correlate a flow's
//! outcome with the decision it was given, so they are part of the wire contract.

use std::time::Duration;

/// Library name reported in the telemetry resource and used as tracer name.
pub const LIBRARY_NAME: &str = "aperture-rs";
/// Library version reported in the telemetry resource.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response header carrying the caller IP as observed by the agent.
pub const CLIENT_IP_HEADER: &str = "client-ip";

/// Name of the span opened for every flow.
pub const FLOW_SPAN_NAME: &str = "Aperture Check";

pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_millis(200);
pub const DEFAULT_RECONNECTION_PERIOD: Duration = Duration::from_secs(10);

/// Source of the flow; always [`SOURCE_SDK`] for this library.
pub const SOURCE: &str = "aperture.source";
pub const SOURCE_SDK: &str = "sdk";
/// Feature status reported by `end` (`Ok` / `Error`).
pub const FEATURE_STATUS: &str = "aperture.feature_status";
/// Caller IP taken from the check response metadata.
pub const FEATURE_IP: &str = "aperture.feature_ip";
/// JSON encoded check response.
pub const CHECK_RESPONSE: &str = "aperture.check_response";
/// Free-text error description passed to `end`.
pub const FEATURE_ERROR: &str = "aperture.feature_error";
/// Flow start, Unix nanoseconds.
pub const FLOW_START_TIMESTAMP: &str = "aperture.flow_start_timestamp";
/// Flow stop, Unix nanoseconds.
pub const FLOW_STOP_TIMESTAMP: &str = "aperture.flow_stop_timestamp";
/// Check response received, Unix nanoseconds.
pub const CHECK_RESPONSE_TIMESTAMP: &str = "aperture.check_response_timestamp";
