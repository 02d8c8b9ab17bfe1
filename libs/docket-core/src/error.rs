//! Error types for the Docket core library

use thiserror::Error;

/// Result type alias for Docket operations
pub type Result<T> = std::result::Result<T, DocketError>;

/// Main error type for Docket operations
#[derive(Error, Debug)]
pub enum DocketError {
    /// Malformed or out-of-allow-list query input
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// Backing store unreachable, timed out, or rejected the query
    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocketError {
    /// Create a validation error for a named query parameter
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error was caused by caller input
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// HTTP status code the response layer should use for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Store { .. }
            | Self::Configuration { .. }
            | Self::Serialization(_)
            | Self::Io(_) => 500,
        }
    }
}

impl From<sqlx::Error> for DocketError {
    fn from(e: sqlx::Error) -> Self {
        Self::store(e.to_string())
    }
}
