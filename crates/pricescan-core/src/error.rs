//! Centralized error types for the price scanner.

use thiserror::Error;

/// Main error type for analysis operations.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Image too large: {size} bytes exceeds the limit of {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),
}

/// Result type for analysis operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    Upstream,
}

impl ScanError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an upstream error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::ImageTooLarge { .. } => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Upstream(_) | Self::MalformedModelOutput(_) => ErrorKind::Upstream,
        }
    }
}
