//! Core error types.

/// Errors raised while reading host bindings.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0} environment variable is not set")]
    MissingBinding(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidBinding { name: String, reason: String },
}
