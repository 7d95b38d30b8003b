//! Shared fakes for client tests: an in-process flow control service and an
//! in-memory span pipeline.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::{InMemorySpanExporter, InMemorySpanExporterBuilder};
use opentelemetry_sdk::trace::TracerProvider;
use tonic::metadata::MetadataValue;
use tonic::{Request, Response, Status};

use aperture_client::{ApertureClient, ClientSettings, FlowControlService, Telemetry};
use aperture_core::protocol::{CheckRequest, CheckResponse, DecisionType};

#[derive(Clone)]
pub enum Behavior {
    /// Reply with this raw decision type value.
    Decide(i32),
    /// Fail with this status code.
    Fail(tonic::Code),
    /// Sleep, then accept.
    Stall(Duration),
}

pub struct FakeFlowControl {
    behavior: Behavior,
    client_ips: Vec<&'static str>,
    pub requests: Mutex<Vec<Request<CheckRequest>>>,
}

impl FakeFlowControl {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Self::with_client_ips(behavior, vec![])
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(Behavior::Decide(DecisionType::Accepted as i32))
    }

    pub fn with_client_ips(behavior: Behavior, client_ips: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            client_ips,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> CheckRequest {
        self.requests.lock().unwrap().last().unwrap().get_ref().clone()
    }

    fn stamp(&self, md: &mut tonic::metadata::MetadataMap) {
        for ip in &self.client_ips {
            md.append("client-ip", MetadataValue::from_static(*ip));
        }
    }
}

#[async_trait]
impl FlowControlService for FakeFlowControl {
    async fn check(&self, request: Request<CheckRequest>) -> Result<Response<CheckResponse>, Status> {
        self.requests.lock().unwrap().push(request);
        match &self.behavior {
            Behavior::Decide(d) => {
                let mut resp = Response::new(CheckResponse {
                    decision_type: *d,
                    control_point: "ingress".into(),
                    ..Default::default()
                });
                self.stamp(resp.metadata_mut());
                Ok(resp)
            }
            Behavior::Fail(code) => {
                let mut status = Status::new(*code, "agent unreachable");
                self.stamp(status.metadata_mut());
                Err(status)
            }
            Behavior::Stall(d) => {
                tokio::time::sleep(*d).await;
                Ok(Response::new(CheckResponse::with_decision(DecisionType::Accepted)))
            }
        }
    }
}

pub fn in_memory_telemetry() -> (Telemetry, InMemorySpanExporter) {
    let exporter = InMemorySpanExporterBuilder::new().build();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (Telemetry::from_provider(provider), exporter)
}

pub fn client(service: Arc<FakeFlowControl>) -> (ApertureClient<Arc<FakeFlowControl>>, InMemorySpanExporter) {
    client_with(service, ClientSettings::default())
}

pub fn client_with(
    service: Arc<FakeFlowControl>,
    settings: ClientSettings,
) -> (ApertureClient<Arc<FakeFlowControl>>, InMemorySpanExporter) {
    let (telemetry, exporter) = in_memory_telemetry();
    (ApertureClient::with_service(service, telemetry, settings), exporter)
}

pub fn finished(exporter: &InMemorySpanExporter) -> Vec<SpanData> {
    exporter.get_finished_spans().unwrap()
}

pub fn attr(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.as_str().into_owned())
}
