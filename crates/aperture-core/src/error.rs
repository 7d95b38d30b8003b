//! Shared error type across Aperture crates.

use std::time::Duration;

use thiserror::Error;

/// Caller-facing error categories (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client could not be built.
    Construction,
    /// The check round trip failed; the flow was allowed anyway.
    DecisionCall,
    /// `end` was called on a flow that already ended.
    DoubleEnd,
    /// Decision payload could not be serialized for telemetry.
    Serialization,
    /// Configuration file is malformed or out of range.
    Config,
    /// Internal SDK error.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Construction => "CONSTRUCTION",
            ErrorKind::DecisionCall => "DECISION_CALL",
            ErrorKind::DoubleEnd => "DOUBLE_END",
            ErrorKind::Serialization => "SERIALIZATION",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ApertureError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum ApertureError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
    #[error("check timed out after {0:?}")]
    Timeout(Duration),
    #[error("check cancelled")]
    Cancelled,
    #[error("check failed: {0}")]
    Transport(String),
    #[error("feature name must not be empty")]
    InvalidFeature,
    #[error("flow already ended")]
    FlowAlreadyEnded,
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ApertureError {
    /// Map an error onto its stable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApertureError::InvalidOptions(_) | ApertureError::Telemetry(_) => ErrorKind::Construction,
            ApertureError::Timeout(_)
            | ApertureError::Cancelled
            | ApertureError::Transport(_)
            | ApertureError::InvalidFeature => ErrorKind::DecisionCall,
            ApertureError::FlowAlreadyEnded => ErrorKind::DoubleEnd,
            ApertureError::Serialization(_) => ErrorKind::Serialization,
            ApertureError::InvalidConfig(_) | ApertureError::UnsupportedVersion => ErrorKind::Config,
            ApertureError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True when the error came with a fail-open flow and must not gate execution.
    pub fn is_fail_open(&self) -> bool {
        self.kind() == ErrorKind::DecisionCall
    }
}
