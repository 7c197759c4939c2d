//! Per-request application context.

use edge_core::{Env, ExecutionContext, Mode, RequestId};
use edge_session::AppSession;
use edge_storefront::StorefrontClient;

/// Everything the application needs to serve one request.
///
/// Built fresh for every request and dropped once the response is sent.
#[derive(Debug)]
pub struct AppContext {
    /// Request correlation ID.
    pub request_id: RequestId,
    /// The visitor's session.
    pub session: AppSession,
    /// Storefront API client bound to this request.
    pub storefront: StorefrontClient,
    /// Host bindings.
    pub env: Env,
    /// Background work handle.
    pub execution: ExecutionContext,
    /// Runtime mode, as configured on the dispatcher.
    pub mode: Mode,
}

impl AppContext {
    /// Assemble a context from its parts.
    pub fn new(
        request_id: RequestId,
        session: AppSession,
        storefront: StorefrontClient,
        env: Env,
        execution: ExecutionContext,
        mode: Mode,
    ) -> Self {
        Self {
            request_id,
            session,
            storefront,
            env,
            execution,
            mode,
        }
    }

    /// Register background work that may outlive the response.
    pub fn wait_until<F>(&self, work: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.execution.wait_until(work);
    }
}
