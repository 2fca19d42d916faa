//! Error handling module for formwright
//!
//! Provides centralized error types using thiserror. Field validation
//! failures are never errors here: they live in the engine's error map.
//! These types cover configuration problems, IO, and submission failures.

use thiserror::Error;

/// Main error type for formwright
#[derive(Error, Debug)]
pub enum FormError {
    /// IO errors (attachments, terminal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Form configuration errors (duplicate ids, bad bounds, bad patterns)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The submit handler failed; carries the handler's own error
    #[error("Submission failed: {0}")]
    Submit(anyhow::Error),

    /// A field id that the configuration does not declare
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// An array operation was attempted on a non-array field
    #[error("Field {0} does not hold an array")]
    NotAnArray(String),
}

/// Result type alias for formwright operations
pub type Result<T> = std::result::Result<T, FormError>;

impl FormError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unknown-field error
    pub fn unknown_field(id: impl Into<String>) -> Self {
        Self::UnknownField(id.into())
    }
}
