//! Feature execution status reported when a flow ends.

use std::fmt;

/// Outcome of the protected feature, as observed by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// Feature executed successfully.
    Ok,
    /// Feature execution failed (or was not attempted because it was rejected).
    Error,
}

impl Code {
    /// Stable string recorded as `aperture.feature_status`.
    pub fn as_str(self) -> &'static str {
        match self {
            Code::Ok => "Ok",
            Code::Error => "Error",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
