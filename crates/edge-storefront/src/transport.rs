//! Outbound HTTP seam.

use async_trait::async_trait;
use edge_core::{Request, Response};

use crate::StorefrontError;

/// Sends Storefront API requests.
///
/// The host platform supplies the implementation (Spin outbound HTTP in the
/// workload, in-memory fakes in tests).
#[async_trait]
pub trait StorefrontTransport: Send + Sync {
    /// Send a request and buffer the whole response.
    async fn send(&self, request: Request) -> Result<Response, StorefrontError>;
}
