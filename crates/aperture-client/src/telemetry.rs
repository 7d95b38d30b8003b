//! Telemetry binder: owns the tracer provider that flow spans are recorded on.
//!
//! The provider is held by the client and never registered globally; an
//! application that wants a global provider installs one itself.

use std::borrow::Cow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use opentelemetry::trace::{Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::{SpanExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::trace::{Config, Span, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use tonic::transport::Channel;

use aperture_core::attributes::{LIBRARY_NAME, LIBRARY_VERSION};
use aperture_core::error::{ApertureError, Result};

/// Process default resource merged with the library name and version.
pub fn library_resource() -> Resource {
    Resource::default().merge(&Resource::new([
        KeyValue::new("service.name", LIBRARY_NAME),
        KeyValue::new("service.version", LIBRARY_VERSION),
    ]))
}

/// Client-owned tracer provider and the tracer flow spans are started on.
#[derive(Debug, Clone)]
pub struct Telemetry {
    provider: TracerProvider,
    tracer: Tracer,
}

impl Telemetry {
    /// OTLP/gRPC exporter over `channel`, batched on the tokio runtime.
    ///
    /// Fails when called outside a tokio runtime, since the batch processor
    /// spawns its flush task at construction.
    pub fn otlp(channel: Channel, reconnection_period: Duration) -> Result<Self> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ApertureError::Telemetry(
                "span exporter requires a tokio runtime".into(),
            ));
        }

        let exporter = SpanExporter::builder()
            .with_tonic()
            .with_channel(channel)
            .with_timeout(reconnection_period)
            .build()
            .map_err(|e| ApertureError::Telemetry(format!("span exporter: {e}")))?;

        #[allow(deprecated)]
        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_config(Config::default().with_resource(library_resource()))
            .build();

        Ok(Self::from_provider(provider))
    }

    /// Wrap a caller-built provider (custom exporters, tests).
    pub fn from_provider(provider: TracerProvider) -> Self {
        let tracer = provider.tracer(LIBRARY_NAME);
        Self { provider, tracer }
    }

    /// Start a span on the client's tracer as a child of `parent`.
    pub fn start_span(&self, name: impl Into<Cow<'static, str>>, parent: &Context) -> Span {
        self.tracer.start_with_context(name, parent)
    }

    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }

    /// Flush pending spans and stop the exporter. Blocks; run off the async workers.
    pub fn shutdown(&self) -> Result<()> {
        self.provider
            .shutdown()
            .map_err(|e| ApertureError::Telemetry(format!("shutdown: {e}")))
    }
}

/// Unix nanoseconds, as carried by the timestamp attributes.
pub fn unix_nanos(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}
