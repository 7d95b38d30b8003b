//! Aperture flow control demo.
//!
//! Runs one flow against the agent configured in `aperture.yaml` (or the path
//! given as first argument) and prints the resulting client metrics.

use std::collections::HashMap;

use opentelemetry::Context;
use tracing_subscriber::{fmt, EnvFilter};

use aperture_client::rpc::lazy_channel;
use aperture_client::{config, ApertureClient, Client, Code, Flow, Options, Result};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "aperture.yaml".to_string());
    let cfg = config::load_from_file(&path)?;

    let options = Options::from_config(&cfg)
        .with_channel(lazy_channel(&cfg.agent.flow_control_endpoint)?)
        .with_exporter_channel(lazy_channel(cfg.agent.otlp_endpoint())?);
    let client = ApertureClient::new(options)?;

    let labels = HashMap::from([("user".to_string(), "kenobi".to_string())]);
    let (flow, err) = client.begin_flow(&Context::current(), "awesomeFeature", &labels).await;
    if let Some(e) = err {
        tracing::warn!(error = %e, accepted = flow.accepted(), "flow control unavailable, proceeding");
    }

    if flow.accepted() {
        tracing::info!("feature accepted, running");
        flow.end(Code::Ok, None)?;
    } else {
        tracing::info!("feature rejected");
        flow.end(Code::Error, Some("flow rejected by aperture"))?;
    }

    print!("{}", client.metrics().render());
    client.shutdown().await
}
