#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use aperture_core::{ApertureError, Code};

#[test]
fn decision_call_errors_fail_open() {
    for e in [
        ApertureError::Timeout(Duration::from_millis(200)),
        ApertureError::Cancelled,
        ApertureError::Transport("unavailable".into()),
        ApertureError::InvalidFeature,
    ] {
        assert!(e.is_fail_open(), "{e}");
        assert_eq!(e.kind().as_str(), "DECISION_CALL");
    }
}

#[test]
fn other_errors_do_not_fail_open() {
    assert!(!ApertureError::FlowAlreadyEnded.is_fail_open());
    assert_eq!(ApertureError::FlowAlreadyEnded.to_string(), "flow already ended");
    assert_eq!(ApertureError::InvalidOptions("channel".into()).kind().as_str(), "CONSTRUCTION");
    assert_eq!(ApertureError::Serialization("x".into()).kind().as_str(), "SERIALIZATION");
    assert_eq!(ApertureError::UnsupportedVersion.kind().as_str(), "CONFIG");
}

#[test]
fn code_display() {
    assert_eq!(Code::Ok.to_string(), "Ok");
    assert_eq!(Code::Error.as_str(), "Error");
}
