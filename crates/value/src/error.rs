//! Error types for literal parsing and builtin conversions.

use thiserror::Error;

/// A literal string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid literal at offset {position}: {message}")]
pub struct LiteralError {
    /// Byte offset into the source where parsing failed.
    pub position: usize,
    /// Human-readable description.
    pub message: String,
}

impl LiteralError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// A builtin conversion (`int(x)`, `list(x)`, ...) rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConvertError {
    /// Description of the failure, phrased like the builtin constructors.
    pub message: String,
}

impl ConvertError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
