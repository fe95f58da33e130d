//! Serialization-side errors and warnings.

use thiserror::Error;

use super::location::Location;

/// How the serializer treats values that do not match their schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarningMode {
    /// Collect a warning, emit best-effort output, succeed.
    #[default]
    Warn,
    /// Any warning aborts the call with a `SerializationError`.
    Error,
}

/// One mismatch observed while serializing.
#[derive(Debug, Clone)]
pub struct SerializationWarning {
    /// Where in the output tree the mismatch occurred.
    pub location: Location,
    /// What was expected and what was found.
    pub message: String,
}

impl std::fmt::Display for SerializationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Terminal serialization failure.
#[derive(Debug, Clone, Error)]
pub enum SerializationError {
    /// Strict warning mode turned collected mismatches into a failure.
    #[error("serialization produced {} warning(s); first: {}", .0.len(), .0[0])]
    Warnings(Vec<SerializationWarning>),

    /// The output could not be encoded.
    #[error("failed to encode output: {0}")]
    Encode(String),
}

impl SerializationError {
    /// The collected warnings, when the failure carries them.
    pub fn warnings(&self) -> &[SerializationWarning] {
        match self {
            SerializationError::Warnings(w) => w,
            SerializationError::Encode(_) => &[],
        }
    }
}
