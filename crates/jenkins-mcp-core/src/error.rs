//! Error types for jenkins-mcp.

use thiserror::Error;

/// Main error type for jenkins-mcp operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(String),

    /// Jenkins rejected the credential (401/403)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Job or endpoint does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Jenkins returned any other non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not what we expected
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Map an HTTP status code and body to the matching error variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Error::Auth(message),
            404 => Error::NotFound(message),
            _ => Error::Api { status, message },
        }
    }

    /// HTTP status code carried by this error, if Jenkins answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Result type alias for jenkins-mcp operations.
pub type Result<T> = std::result::Result<T, Error>;
