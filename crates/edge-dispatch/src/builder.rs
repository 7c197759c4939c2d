//! Default context builder for storefront workloads.

use std::sync::Arc;

use async_trait::async_trait;
use edge_core::{header_names, header_str, Env, ExecutionContext, Mode, Request, RequestId};
use edge_observability::StructuredLogger;
use edge_session::{CookieOptions, CookieSessionStorage, SessionSecrets};
use edge_storefront::{I18nLocale, StorefrontClient, StorefrontConfig, StorefrontTransport};
use http::header;

use crate::{AppContext, ContextBuilder};

/// Builds an [`AppContext`] from host bindings and the request.
///
/// Requires `SESSION_SECRET`, `PUBLIC_STORE_DOMAIN` and
/// `PUBLIC_STOREFRONT_API_TOKEN`; a missing binding fails the request.
pub struct StorefrontContextBuilder {
    transport: Arc<dyn StorefrontTransport>,
    cookie_options: CookieOptions,
    workload: String,
}

impl StorefrontContextBuilder {
    /// Create a builder that sends Storefront API calls through `transport`.
    pub fn new(transport: Arc<dyn StorefrontTransport>) -> Self {
        Self {
            transport,
            cookie_options: CookieOptions::default(),
            workload: "storefront".to_string(),
        }
    }

    /// Override session cookie attributes.
    pub fn with_cookie_options(mut self, options: CookieOptions) -> Self {
        self.cookie_options = options;
        self
    }

    /// Workload name used in Storefront API logs.
    pub fn with_workload(mut self, workload: impl Into<String>) -> Self {
        self.workload = workload.into();
        self
    }
}

#[async_trait]
impl ContextBuilder for StorefrontContextBuilder {
    async fn build_context(
        &self,
        request: &Request,
        env: &Env,
        execution: &ExecutionContext,
        mode: Mode,
    ) -> anyhow::Result<AppContext> {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId::from_request(request));

        let secrets = SessionSecrets::from_env(env)?;
        let session = CookieSessionStorage::new(secrets)
            .with_options(self.cookie_options.clone())
            .get_session(header_str(request.headers(), header::COOKIE.as_str()))?;

        let logger = StructuredLogger::for_mode(request_id.clone(), mode)
            .with_workload(self.workload.as_str())
            .with_route(request.uri().path());

        let config = StorefrontConfig::from_env(env)?;
        let mut storefront = StorefrontClient::new(config, self.transport.clone())
            .with_i18n(I18nLocale::from_path(request.uri().path()))
            .with_request_id(request_id.clone())
            .with_logger(logger);
        if let Some(ip) = buyer_ip(request) {
            storefront = storefront.with_buyer_ip(ip);
        }

        Ok(AppContext::new(
            request_id,
            session,
            storefront,
            env.clone(),
            execution.clone(),
            mode,
        ))
    }
}

/// Client IP from the edge proxy, falling back to the first forwarded hop.
fn buyer_ip(request: &Request) -> Option<String> {
    let headers = request.headers();
    header_str(headers, header_names::CF_CONNECTING_IP)
        .or_else(|| {
            header_str(headers, header_names::X_FORWARDED_FOR)
                .and_then(|chain| chain.split(',').next())
        })
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
}
