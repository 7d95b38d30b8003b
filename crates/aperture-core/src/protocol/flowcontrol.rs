//! `aperture.flowcontrol.v1` messages (hand-maintained prost definitions).

use std::collections::HashMap;

use bytes::Bytes;
use prost::Message;
use serde::{Serialize, Serializer};

use crate::error::{ApertureError, Result};

/// gRPC path of the check method.
pub const CHECK_PATH: &str = "/aperture.flowcontrol.v1.FlowControlService/Check";

/// Check request: which feature is about to run, and with which labels.
#[derive(Clone, PartialEq, Message)]
pub struct CheckRequest {
    #[prost(string, tag = "1")]
    pub feature: String,
    #[prost(map = "string, string", tag = "2")]
    pub labels: HashMap<String, String>,
}

impl CheckRequest {
    pub fn new(feature: impl Into<String>, labels: HashMap<String, String>) -> Self {
        Self {
            feature: feature.into(),
            labels,
        }
    }
}

/// Decision returned by the agent. Only `decision_type` is interpreted by the SDK.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct CheckResponse {
    /// Services the agent matched the flow against.
    #[prost(string, repeated, tag = "1")]
    pub services: Vec<String>,
    #[prost(string, tag = "2")]
    pub control_point: String,
    #[prost(string, repeated, tag = "3")]
    pub flow_label_keys: Vec<String>,
    #[prost(enumeration = "DecisionType", tag = "5")]
    #[serde(serialize_with = "serialize_decision_type")]
    pub decision_type: i32,
    #[prost(enumeration = "RejectReason", tag = "6")]
    #[serde(serialize_with = "serialize_reject_reason")]
    pub reject_reason: i32,
    #[prost(message, repeated, tag = "7")]
    pub limiter_decisions: Vec<LimiterDecision>,
}

impl CheckResponse {
    /// Convenience constructor for a bare decision.
    pub fn with_decision(decision: DecisionType) -> Self {
        Self {
            decision_type: decision as i32,
            ..Default::default()
        }
    }
}

/// Per-limiter outcome attached to a decision.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct LimiterDecision {
    #[prost(string, tag = "1")]
    pub policy_name: String,
    #[prost(int64, tag = "2")]
    pub component_index: i64,
    #[prost(bool, tag = "3")]
    pub dropped: bool,
    /// Why this limiter dropped the flow; `REJECT_REASON_NONE` when it did not.
    #[prost(enumeration = "RejectReason", tag = "4")]
    #[serde(serialize_with = "serialize_reject_reason")]
    pub reason: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DecisionType {
    Accepted = 0,
    Rejected = 1,
}

impl DecisionType {
    pub fn as_str_name(self) -> &'static str {
        match self {
            DecisionType::Accepted => "DECISION_TYPE_ACCEPTED",
            DecisionType::Rejected => "DECISION_TYPE_REJECTED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum RejectReason {
    None = 0,
    RateLimited = 1,
    Concurrency = 2,
}

impl RejectReason {
    pub fn as_str_name(self) -> &'static str {
        match self {
            RejectReason::None => "REJECT_REASON_NONE",
            RejectReason::RateLimited => "REJECT_REASON_RATE_LIMITED",
            RejectReason::Concurrency => "REJECT_REASON_CONCURRENCY",
        }
    }
}

// Enum fields are serialized by name, like protobuf JSON; unknown values fall back to the number.
fn serialize_decision_type<S: Serializer>(v: &i32, s: S) -> std::result::Result<S::Ok, S::Error> {
    match DecisionType::try_from(*v) {
        Ok(d) => s.serialize_str(d.as_str_name()),
        Err(_) => s.serialize_i32(*v),
    }
}

fn serialize_reject_reason<S: Serializer>(v: &i32, s: S) -> std::result::Result<S::Ok, S::Error> {
    match RejectReason::try_from(*v) {
        Ok(r) => s.serialize_str(r.as_str_name()),
        Err(_) => s.serialize_i32(*v),
    }
}

/// Decode a check response from raw protobuf bytes.
pub fn decode_check_response(buf: Bytes) -> Result<CheckResponse> {
    CheckResponse::decode(buf)
        .map_err(|e| ApertureError::Internal(format!("invalid check response: {e}")))
}

/// JSON form of a (possibly absent) decision, as attached to flow spans.
/// An absent decision encodes as `{}`.
pub fn check_response_json(res: Option<&CheckResponse>) -> Result<String> {
    match res {
        Some(r) => serde_json::to_string(r).map_err(|e| ApertureError::Serialization(e.to_string())),
        None => Ok("{}".to_string()),
    }
}
