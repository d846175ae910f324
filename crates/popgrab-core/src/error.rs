//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// POP3 operation failed.
    #[error("POP3 error: {0}")]
    Pop3(#[from] popgrab_pop3::Error),

    /// MIME decoding failed.
    #[error("MIME error: {0}")]
    Mime(#[from] popgrab_mime::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// State snapshot serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file parse error.
    #[error("Configuration parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted state error.
    #[error("State error: {0}")]
    State(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
