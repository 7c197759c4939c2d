//! Session error types.

use edge_core::CoreError;
use thiserror::Error;

/// Errors that can occur when reading or committing a session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Secret configuration is missing or unusable.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// The cookie signature checked out but the payload could not be decoded.
    #[error("Malformed session cookie: {0}")]
    Malformed(String),

    /// Failed to serialize a session value.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The committed cookie would exceed what browsers accept.
    #[error("Session cookie too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    /// The HMAC key was rejected.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}
