//! Collaborator seams of the dispatcher.

use async_trait::async_trait;
use edge_core::{Env, ExecutionContext, Mode, Request, Response};
use edge_storefront::RedirectRequest;

use crate::AppContext;

/// Builds the per-request application context.
#[async_trait]
pub trait ContextBuilder: Send + Sync {
    /// Build a fresh context for `request`. `mode` is the dispatcher's
    /// configured mode and must be the one the context carries.
    async fn build_context(
        &self,
        request: &Request,
        env: &Env,
        execution: &ExecutionContext,
        mode: Mode,
    ) -> anyhow::Result<AppContext>;
}

/// The application build: turns a request into a response.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Render a response. Called exactly once per request.
    async fn handle(&self, request: &Request, context: &AppContext) -> anyhow::Result<Response>;
}

/// Decides what to serve instead of a not-found response.
#[async_trait]
pub trait RedirectResolver: Send + Sync {
    /// Return a replacement response, or `redirect.response` unchanged.
    async fn resolve(&self, redirect: RedirectRequest<'_>) -> anyhow::Result<Response>;
}
