//! Flow control client: the entry point applications hold for the process lifetime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use async_trait::async_trait;
use opentelemetry::baggage::BaggageExt;
use opentelemetry::trace::Span as _;
use opentelemetry::{Context, KeyValue};
use tonic::metadata::MetadataMap;
use tonic::Request;
use tracing::{debug, info, warn};

use aperture_core::attributes::{
    CHECK_RESPONSE_TIMESTAMP, CLIENT_IP_HEADER, FLOW_SPAN_NAME, FLOW_START_TIMESTAMP, SOURCE,
    SOURCE_SDK,
};
use aperture_core::error::{ApertureError, Result};
use aperture_core::labels::resolve_labels;
use aperture_core::protocol::{CheckRequest, CheckResponse, DecisionType};

use crate::config::{ClientSettings, Options};
use crate::flow::ApertureFlow;
use crate::obs::ClientMetrics;
use crate::rpc::{FlowControlService, GrpcFlowControl};
use crate::telemetry::{unix_nanos, Telemetry};

/// Capability to begin flows. Implemented by [`ApertureClient`]; applications
/// can substitute their own implementation in tests.
#[async_trait]
pub trait Client: Send + Sync {
    type Flow: crate::flow::Flow;

    /// Ask the agent whether `feature` may run.
    ///
    /// Always returns a usable flow. The error, when present, describes why no
    /// decision was obtained; the flow is then accepted (fail-open) and the
    /// error is for logging only.
    async fn begin_flow(
        &self,
        cx: &Context,
        feature: &str,
        labels: &HashMap<String, String>,
    ) -> (Self::Flow, Option<ApertureError>);
}

/// Client bound to a flow control service and a telemetry binder.
/// Cheap to clone; clones share the service, tracer, and metrics.
pub struct ApertureClient<S = GrpcFlowControl> {
    inner: Arc<ClientInner<S>>,
}

struct ClientInner<S> {
    service: S,
    telemetry: Telemetry,
    settings: ClientSettings,
    metrics: Arc<ClientMetrics>,
}

impl<S> Clone for ApertureClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ApertureClient<GrpcFlowControl> {
    /// Build a client over the channel in `options`, exporting spans over
    /// `exporter_channel` (or the same channel). Must run inside a tokio runtime.
    pub fn new(options: Options) -> Result<Self> {
        let channel = options.validate()?.clone();
        let exporter_channel = options.exporter_channel.clone().unwrap_or_else(|| channel.clone());
        let settings = options.settings();

        let telemetry = Telemetry::otlp(exporter_channel, settings.reconnection_period)?;

        info!(
            check_timeout_ms = settings.check_timeout.as_millis() as u64,
            reconnection_period_ms = settings.reconnection_period.as_millis() as u64,
            "aperture client created"
        );
        Ok(Self::with_service(GrpcFlowControl::new(channel), telemetry, settings))
    }
}

impl<S: FlowControlService> ApertureClient<S> {
    /// Build a client over any flow control service implementation.
    pub fn with_service(service: S, telemetry: Telemetry, settings: ClientSettings) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                service,
                telemetry,
                settings,
                metrics: Arc::new(ClientMetrics::default()),
            }),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.inner.metrics
    }

    /// Like [`Client::begin_flow`], but the check is abandoned as soon as
    /// `cancel` completes; the flow then fails open with `Cancelled`.
    pub async fn begin_flow_with_cancel<C>(
        &self,
        cx: &Context,
        feature: &str,
        labels: &HashMap<String, String>,
        cancel: C,
    ) -> (ApertureFlow, Option<ApertureError>)
    where
        C: Future<Output = ()> + Send,
    {
        let inner = &self.inner;
        inner.metrics.flows_started.inc(&[("feature", feature)]);

        let mut span = inner.telemetry.start_span(FLOW_SPAN_NAME, cx);
        span.set_attribute(KeyValue::new(SOURCE, SOURCE_SDK));
        span.set_attribute(KeyValue::new(FLOW_START_TIMESTAMP, unix_nanos(SystemTime::now())));

        if feature.is_empty() {
            span.set_attribute(KeyValue::new(CHECK_RESPONSE_TIMESTAMP, unix_nanos(SystemTime::now())));
            return self.fail_open(span, None, ApertureError::InvalidFeature);
        }

        let mut ambient = inner
            .settings
            .base_context
            .as_ref()
            .map(baggage_pairs)
            .unwrap_or_default();
        ambient.extend(baggage_pairs(cx));
        let labels = resolve_labels(ambient, labels);

        let timeout = inner.settings.check_timeout;
        let mut request = Request::new(CheckRequest::new(feature, labels));
        request.set_timeout(timeout);

        let started = Instant::now();
        let outcome = tokio::select! {
            res = tokio::time::timeout(timeout, inner.service.check(request)) => match res {
                Ok(Ok(resp)) => Ok(resp),
                Ok(Err(status)) => Err((
                    ApertureError::Transport(format!("{:?}: {}", status.code(), status.message())),
                    client_ip(status.metadata()),
                )),
                Err(_) => Err((ApertureError::Timeout(timeout), None)),
            },
            _ = cancel => Err((ApertureError::Cancelled, None)),
        };
        inner.metrics.check_duration.observe(&[], started.elapsed());
        span.set_attribute(KeyValue::new(CHECK_RESPONSE_TIMESTAMP, unix_nanos(SystemTime::now())));

        match outcome {
            Ok(resp) => {
                let ip = client_ip(resp.metadata());
                let res = resp.into_inner();
                let decision = decision_label(&res);
                inner.metrics.decisions.inc(&[("decision", decision)]);
                debug!(feature, decision, "flow control decision");
                (ApertureFlow::new(Some(res), ip, span, Arc::clone(&inner.metrics)), None)
            }
            Err((e, ip)) => self.fail_open(span, ip, e),
        }
    }

    fn fail_open(
        &self,
        span: opentelemetry_sdk::trace::Span,
        ip: Option<String>,
        err: ApertureError,
    ) -> (ApertureFlow, Option<ApertureError>) {
        let reason = match &err {
            ApertureError::Timeout(_) => "timeout",
            ApertureError::Cancelled => "cancelled",
            ApertureError::InvalidFeature => "invalid_feature",
            _ => "transport",
        };
        self.inner.metrics.fail_open.inc(&[("reason", reason)]);
        warn!(error = %err, reason, "flow control check failed, failing open");
        (ApertureFlow::new(None, ip, span, Arc::clone(&self.inner.metrics)), Some(err))
    }

    /// Flush and stop the span exporter. Call once during graceful shutdown.
    pub async fn shutdown(&self) -> Result<()> {
        let telemetry = self.inner.telemetry.clone();
        tokio::task::spawn_blocking(move || telemetry.shutdown())
            .await
            .map_err(|e| ApertureError::Internal(format!("telemetry shutdown task: {e}")))??;
        info!("aperture client shut down");
        Ok(())
    }
}

#[async_trait]
impl<S: FlowControlService> Client for ApertureClient<S> {
    type Flow = ApertureFlow;

    async fn begin_flow(
        &self,
        cx: &Context,
        feature: &str,
        labels: &HashMap<String, String>,
    ) -> (ApertureFlow, Option<ApertureError>) {
        self.begin_flow_with_cancel(cx, feature, labels, std::future::pending())
            .await
    }
}

fn baggage_pairs(cx: &Context) -> Vec<(String, String)> {
    cx.baggage()
        .iter()
        .map(|(k, (v, _))| (k.as_str().to_string(), v.to_string()))
        .collect()
}

/// Exactly one `client-ip` value is trusted; zero or several leave it unset.
fn client_ip(md: &MetadataMap) -> Option<String> {
    let mut values = md.get_all(CLIENT_IP_HEADER).iter();
    let first = values.next()?;
    if values.next().is_some() {
        return None;
    }
    first.to_str().ok().map(str::to_string)
}

fn decision_label(res: &CheckResponse) -> &'static str {
    if res.decision_type == DecisionType::Accepted as i32 {
        "accepted"
    } else {
        "rejected"
    }
}
