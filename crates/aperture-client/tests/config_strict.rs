#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use aperture_client::rpc::lazy_channel;
use aperture_client::{config, ApertureClient, Options};
use aperture_core::ErrorKind;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
client:
  check_timeout_msec: 300 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.client.check_timeout_ms, 200);
    assert_eq!(cfg.client.reconnection_period_ms, 10_000);
    assert_eq!(cfg.agent.flow_control_endpoint, "http://localhost:8080");
    assert_eq!(cfg.agent.otlp_endpoint(), "http://localhost:8080");
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
client:
  check_timeout_ms: 150
  reconnection_period_ms: 5000
agent:
  flow_control_endpoint: "http://agent:8080"
  otlp_endpoint: "http://agent:4317"
"#;
    let cfg = config::load_from_str(ok).unwrap();
    assert_eq!(cfg.agent.otlp_endpoint(), "http://agent:4317");

    let settings = Options::from_config(&cfg).settings();
    assert_eq!(settings.check_timeout, Duration::from_millis(150));
    assert_eq!(settings.reconnection_period, Duration::from_secs(5));
}

#[test]
fn wrong_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").unwrap_err();
    assert!(matches!(err, aperture_core::ApertureError::UnsupportedVersion));
}

#[test]
fn out_of_range_timeout_is_rejected() {
    let err = config::load_from_str("version: 1\nclient:\n  check_timeout_ms: 0\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn endpoint_must_be_http_url() {
    let err = config::load_from_str("version: 1\nagent:\n  flow_control_endpoint: \"agent:8080\"\n").unwrap_err();
    assert!(err.to_string().contains("agent.flow_control_endpoint"));
}

#[test]
fn missing_channel_is_a_construction_error() {
    let err = ApertureClient::new(Options::default()).err().expect("must fail");
    assert_eq!(err.kind(), ErrorKind::Construction);
    assert_eq!(err.to_string(), "invalid options: channel is required");
}

#[tokio::test]
async fn validate_hands_back_the_channel() {
    assert!(Options::default().validate().is_err());

    let channel = lazy_channel("http://127.0.0.1:1").unwrap();
    assert!(Options::new(channel).validate().is_ok());
}

#[test]
fn zero_durations_fall_back_to_defaults() {
    let settings = Options {
        check_timeout: Some(Duration::ZERO),
        reconnection_period: Some(Duration::ZERO),
        ..Default::default()
    }
    .settings();
    assert_eq!(settings.check_timeout, Duration::from_millis(200));
    assert_eq!(settings.reconnection_period, Duration::from_secs(10));
}
