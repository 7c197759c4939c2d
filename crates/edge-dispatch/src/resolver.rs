//! Redirect resolvers.

use async_trait::async_trait;
use edge_core::Response;
use edge_storefront::{storefront_redirect, RedirectOptions, RedirectRequest};

use crate::RedirectResolver;

/// Resolves not-found responses against the shop's URL redirects.
#[derive(Debug, Clone, Default)]
pub struct StorefrontRedirect {
    options: RedirectOptions,
}

impl StorefrontRedirect {
    /// Create a resolver with explicit options.
    pub fn new(options: RedirectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl RedirectResolver for StorefrontRedirect {
    async fn resolve(&self, redirect: RedirectRequest<'_>) -> anyhow::Result<Response> {
        Ok(storefront_redirect(redirect, &self.options).await?)
    }
}

/// Resolver that never redirects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

#[async_trait]
impl RedirectResolver for PassThrough {
    async fn resolve(&self, redirect: RedirectRequest<'_>) -> anyhow::Result<Response> {
        Ok(redirect.response)
    }
}
