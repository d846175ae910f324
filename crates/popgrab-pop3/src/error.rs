//! Error types for the POP3 library.

use thiserror::Error;

/// Errors that can occur during POP3 operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Authentication failed (server rejected USER or PASS).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server returned -ERR for a command.
    #[error("Server returned -ERR: {0}")]
    Server(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
