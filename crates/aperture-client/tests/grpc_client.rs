//! Construction and round trips over a real (unreachable) gRPC channel.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::time::Duration;

use opentelemetry::Context;

use aperture_client::rpc::lazy_channel;
use aperture_client::{ApertureClient, Client, Code, Flow, Options};

#[tokio::test]
async fn lazy_channel_rejects_bad_endpoint() {
    assert!(lazy_channel("http://127.0.0.1:1").is_ok());
    assert!(lazy_channel("not a uri").is_err());
}

#[test]
fn otlp_telemetry_needs_a_runtime() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let channel = rt.block_on(async { lazy_channel("http://127.0.0.1:1").unwrap() });

    let err = ApertureClient::new(Options::new(channel)).err().expect("no runtime entered");
    assert_eq!(err.kind().as_str(), "CONSTRUCTION");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_agent_fails_open() {
    let channel = lazy_channel("http://127.0.0.1:1").unwrap();
    let options = Options {
        reconnection_period: Some(Duration::from_millis(100)),
        ..Options::new(channel)
    };
    let client = ApertureClient::new(options).unwrap();

    let labels = HashMap::from([("user".to_string(), "kenobi".to_string())]);
    let (flow, err) = client.begin_flow(&Context::new(), "awesomeFeature", &labels).await;

    assert!(err.unwrap().is_fail_open());
    assert!(flow.accepted());
    assert!(flow.check_response().is_none());
    flow.end(Code::Ok, None).unwrap();
    assert_eq!(client.metrics().flows_ended.get(&[("status", "Ok")]), 1);

    // Export to the unreachable agent may fail; only the flush path is exercised.
    let _ = client.shutdown().await;
}
