//! Submission outcomes and the user-facing error taxonomy.

use std::fmt;

/// The kind of failure shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing form input. Never reaches the network.
    Validation,

    /// The server answered with an error status.
    RemoteRejection,

    /// No response was received.
    Connectivity,

    /// Speech recognition or geolocation is absent on this device.
    UnsupportedCapability,

    /// A geolocation or weather read failed. Autofill is skipped.
    TransientSensor,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation error",
            Self::RemoteRejection => "rejected by server",
            Self::Connectivity => "connectivity error",
            Self::UnsupportedCapability => "unsupported capability",
            Self::TransientSensor => "sensor error",
        })
    }
}

/// The outcome of one submission attempt.
///
/// Held per view and replaced wholesale on every attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult<T> {
    Success(T),
    Failure { kind: ErrorKind, message: String },
}

impl<T> SubmissionResult<T> {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    #[cfg(test)]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}
