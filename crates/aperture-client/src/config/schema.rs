use serde::Deserialize;

use aperture_core::error::{ApertureError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub agent: AgentSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ApertureError::UnsupportedVersion);
        }
        self.client.validate()?;
        self.agent.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,

    #[serde(default = "default_reconnection_period_ms")]
    pub reconnection_period_ms: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            check_timeout_ms: default_check_timeout_ms(),
            reconnection_period_ms: default_reconnection_period_ms(),
        }
    }
}

impl ClientSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=60_000).contains(&self.check_timeout_ms) {
            return Err(ApertureError::InvalidConfig(
                "client.check_timeout_ms must be between 1 and 60000".into(),
            ));
        }
        if !(100..=600_000).contains(&self.reconnection_period_ms) {
            return Err(ApertureError::InvalidConfig(
                "client.reconnection_period_ms must be between 100 and 600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_check_timeout_ms() -> u64 {
    200
}
fn default_reconnection_period_ms() -> u64 {
    10_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    #[serde(default = "default_flow_control_endpoint")]
    pub flow_control_endpoint: String,

    /// Trace export endpoint; the flow control endpoint when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            flow_control_endpoint: default_flow_control_endpoint(),
            otlp_endpoint: None,
        }
    }
}

impl AgentSection {
    pub fn validate(&self) -> Result<()> {
        check_endpoint("agent.flow_control_endpoint", &self.flow_control_endpoint)?;
        if let Some(ep) = &self.otlp_endpoint {
            check_endpoint("agent.otlp_endpoint", ep)?;
        }
        Ok(())
    }

    pub fn otlp_endpoint(&self) -> &str {
        self.otlp_endpoint.as_deref().unwrap_or(&self.flow_control_endpoint)
    }
}

fn check_endpoint(field: &str, ep: &str) -> Result<()> {
    if !(ep.starts_with("http://") || ep.starts_with("https://")) {
        return Err(ApertureError::InvalidConfig(format!(
            "{field} must be an http:// or https:// url"
        )));
    }
    Ok(())
}

fn default_flow_control_endpoint() -> String {
    "http://localhost:8080".into()
}
