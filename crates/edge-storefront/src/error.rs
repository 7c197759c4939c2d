//! Storefront error types.

use edge_core::CoreError;

/// Errors raised while talking to the Storefront API.
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid redirect target: {0}")]
    InvalidRedirect(String),
}

impl From<serde_json::Error> for StorefrontError {
    fn from(e: serde_json::Error) -> Self {
        StorefrontError::Deserialization(e.to_string())
    }
}
