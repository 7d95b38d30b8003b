//! Flow: one check-and-report cycle around a protected feature.
//!
//! A flow is created by `begin_flow` with its span already open and is closed
//! by exactly one `end`, or by drop when `end` is never called. Later `end`
//! calls return `FlowAlreadyEnded` and never touch the span again, including
//! when they race from different threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use opentelemetry::trace::{Span as _, Status};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::Span;
use tracing::{debug, warn};

use aperture_core::attributes::{
    CHECK_RESPONSE, FEATURE_ERROR, FEATURE_IP, FEATURE_STATUS, FLOW_STOP_TIMESTAMP,
};
use aperture_core::error::{ApertureError, Result};
use aperture_core::protocol::{check_response_json, CheckResponse, DecisionType};
use aperture_core::Code;

use crate::obs::ClientMetrics;
use crate::telemetry::unix_nanos;

/// Feature error recorded when a flow goes out of scope without `end`.
pub const DROPPED_WITHOUT_END: &str = "flow dropped without end";

/// Handle returned to the application for every `begin_flow`.
pub trait Flow: Send + Sync {
    /// True when the agent accepted the flow, or when no decision was received.
    fn accepted(&self) -> bool;

    /// Raw decision; `None` when the flow failed open.
    fn check_response(&self) -> Option<&CheckResponse>;

    /// Report the feature outcome and close the flow's span. At most once.
    fn end(&self, code: Code, description: Option<&str>) -> Result<()>;
}

/// Flow handed out by [`ApertureClient`](crate::ApertureClient).
///
/// Dropping it without `end` still closes the span, recorded as `Code::Error`
/// with [`DROPPED_WITHOUT_END`].
pub struct ApertureFlow {
    check_response: Option<CheckResponse>,
    client_ip: Option<String>,
    span: Mutex<Option<Span>>,
    ended: AtomicBool,
    metrics: Arc<ClientMetrics>,
}

impl ApertureFlow {
    pub(crate) fn new(
        check_response: Option<CheckResponse>,
        client_ip: Option<String>,
        span: Span,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        metrics.flows_in_flight.inc(&[]);
        Self {
            check_response,
            client_ip,
            span: Mutex::new(Some(span)),
            ended: AtomicBool::new(false),
            metrics,
        }
    }

    /// Caller IP reported by the agent, when exactly one value was sent.
    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }

    /// True once `end` ran (or the flow was dropped).
    pub fn ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

impl Flow for ApertureFlow {
    fn accepted(&self) -> bool {
        match &self.check_response {
            None => true,
            Some(res) => res.decision_type == DecisionType::Accepted as i32,
        }
    }

    fn check_response(&self) -> Option<&CheckResponse> {
        self.check_response.as_ref()
    }

    fn end(&self, code: Code, description: Option<&str>) -> Result<()> {
        if !self.claim_end() {
            warn!("flow already ended");
            self.metrics.double_end.inc(&[]);
            return Err(ApertureError::FlowAlreadyEnded);
        }
        self.close(code, description, code.as_str())
    }
}

impl ApertureFlow {
    fn claim_end(&self) -> bool {
        self.ended
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record the outcome on the span and close it. Caller must hold the end claim.
    fn close(&self, code: Code, description: Option<&str>, outcome: &str) -> Result<()> {
        // Poisoned lock: treat as already closed rather than panic.
        let span = match self.span.lock() {
            Ok(mut g) => g.take(),
            Err(_) => None,
        };
        let Some(span) = span else {
            return Err(ApertureError::FlowAlreadyEnded);
        };
        let mut span = EndOnDrop(span);

        span.0.set_attribute(KeyValue::new(FEATURE_STATUS, code.as_str()));
        if let Some(ip) = &self.client_ip {
            span.0.set_attribute(KeyValue::new(FEATURE_IP, ip.clone()));
        }
        if let Some(desc) = description {
            span.0.set_attribute(KeyValue::new(FEATURE_ERROR, desc.to_string()));
        }

        let json = check_response_json(self.check_response.as_ref());
        match &json {
            Ok(j) => span.0.set_attribute(KeyValue::new(CHECK_RESPONSE, j.clone())),
            Err(e) => warn!(error = %e, "check response not attached to flow span"),
        }

        span.0.set_attribute(KeyValue::new(FLOW_STOP_TIMESTAMP, unix_nanos(SystemTime::now())));
        span.0.set_status(match code {
            Code::Ok => Status::Ok,
            Code::Error => Status::error(description.unwrap_or("feature execution failed").to_string()),
        });
        drop(span);

        self.metrics.flows_in_flight.dec(&[]);
        self.metrics.flows_ended.inc(&[("status", outcome)]);
        debug!(status = %code, accepted = self.accepted(), "flow ended");

        json.map(|_| ())
    }
}

impl Drop for ApertureFlow {
    fn drop(&mut self) {
        if !self.claim_end() {
            return;
        }
        warn!("flow dropped without end");
        if let Err(e) = self.close(Code::Error, Some(DROPPED_WITHOUT_END), "dropped") {
            debug!(error = %e, "dropped flow not fully recorded");
        }
    }
}

/// Closes the span when dropped, whatever path `end` takes.
struct EndOnDrop(Span);

impl Drop for EndOnDrop {
    fn drop(&mut self) {
        self.0.end();
    }
}
