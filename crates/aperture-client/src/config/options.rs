//! Programmatic construction options.

use std::time::Duration;

use opentelemetry::Context;
use tonic::transport::Channel;

use aperture_core::attributes::{DEFAULT_CHECK_TIMEOUT, DEFAULT_RECONNECTION_PERIOD};
use aperture_core::error::{ApertureError, Result};

use super::schema::ClientConfig;

/// Options passed to [`crate::ApertureClient::new`]. `channel` is required.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Connected channel to the flow control service.
    pub channel: Option<Channel>,
    /// Channel for trace export; `channel` when unset.
    pub exporter_channel: Option<Channel>,
    /// Bound on each check round trip. `None` or zero means 200ms.
    pub check_timeout: Option<Duration>,
    /// Bound on each trace export attempt. `None` or zero means 10s.
    pub reconnection_period: Option<Duration>,
    /// Base context whose baggage is applied to every flow, below call-site baggage.
    pub tracing_context: Option<Context>,
}

impl Options {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel: Some(channel),
            ..Default::default()
        }
    }

    /// Durations from a loaded config file; channels still have to be supplied.
    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self {
            check_timeout: Some(Duration::from_millis(cfg.client.check_timeout_ms)),
            reconnection_period: Some(Duration::from_millis(cfg.client.reconnection_period_ms)),
            ..Default::default()
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_exporter_channel(mut self, channel: Channel) -> Self {
        self.exporter_channel = Some(channel);
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = Some(timeout);
        self
    }

    pub fn with_tracing_context(mut self, cx: Context) -> Self {
        self.tracing_context = Some(cx);
        self
    }

    /// Check required fields and hand back the decision channel.
    pub fn validate(&self) -> Result<&Channel> {
        self.channel
            .as_ref()
            .ok_or_else(|| ApertureError::InvalidOptions("channel is required".into()))
    }

    /// Resolve defaults into the immutable settings a client runs with.
    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            check_timeout: non_zero_or(self.check_timeout, DEFAULT_CHECK_TIMEOUT),
            reconnection_period: non_zero_or(self.reconnection_period, DEFAULT_RECONNECTION_PERIOD),
            base_context: self.tracing_context.clone(),
        }
    }
}

fn non_zero_or(v: Option<Duration>, default: Duration) -> Duration {
    match v {
        Some(d) if !d.is_zero() => d,
        _ => default,
    }
}

/// Resolved client settings. Immutable once the client is built.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub check_timeout: Duration,
    pub reconnection_period: Duration,
    pub base_context: Option<Context>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Options::default().settings()
    }
}
