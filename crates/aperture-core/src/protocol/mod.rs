//! Flow control wire contracts.
//!
//! Hosts the protobuf messages of the `aperture.flowcontrol.v1` check call.
//! Decoding is panic-free: malformed payloads are reported as `ApertureError`
//! so a misbehaving agent can never crash the process it guards.

pub mod flowcontrol;

pub use flowcontrol::{
    check_response_json, decode_check_response, CheckRequest, CheckResponse, DecisionType,
    LimiterDecision, RejectReason, CHECK_PATH,
};
