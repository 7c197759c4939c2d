//! Reference storefront workload.
//!
//! Wires the platform dispatcher to Spin:
//! - Host variables become the dispatcher's [`Env`]
//! - Storefront API calls go out through Spin's outbound HTTP
//! - Not-found responses are checked against the shop's URL redirects
//! - Background work is drained before the component returns

pub mod app;

use std::sync::Arc;

use async_trait::async_trait;
use edge_core::{Env, ExecutionContext, Request, Response};
use edge_dispatch::{Dispatcher, DispatcherConfig, StorefrontContextBuilder, StorefrontRedirect};
use edge_session::SESSION_SECRET_BINDING;
use edge_storefront::{bindings, StorefrontError, StorefrontTransport};
use spin_sdk::http_component;

pub use app::StorefrontApp;

const WORKLOAD: &str = "storefront";

/// Every binding the workload reads. Spin variable names are the
/// lower-cased binding names.
const BINDINGS: [&str; 8] = [
    SESSION_SECRET_BINDING,
    bindings::STORE_DOMAIN,
    bindings::PUBLIC_TOKEN,
    bindings::PRIVATE_TOKEN,
    bindings::API_VERSION,
    bindings::STOREFRONT_ID,
    "NODE_ENV",
    "MODE",
];

/// Storefront API transport over Spin outbound HTTP.
#[derive(Debug, Default)]
pub struct SpinTransport;

#[async_trait]
impl StorefrontTransport for SpinTransport {
    async fn send(&self, request: Request) -> Result<Response, StorefrontError> {
        let response: http::Response<Vec<u8>> = spin_sdk::http::send(request)
            .await
            .map_err(|e| StorefrontError::Transport(e.to_string()))?;
        Ok(response)
    }
}

/// Read host variables into an [`Env`]. Unset variables are left out.
pub fn env_from_variables() -> Env {
    BINDINGS
        .iter()
        .filter_map(|name| {
            spin_sdk::variables::get(&name.to_ascii_lowercase())
                .ok()
                .map(|value| (name.to_string(), value))
        })
        .collect()
}

/// Main HTTP handler.
#[http_component]
async fn handle(request: http::Request<Vec<u8>>) -> anyhow::Result<http::Response<Vec<u8>>> {
    let env = env_from_variables();
    let execution = ExecutionContext::new();

    let dispatcher = Dispatcher::new(
        DispatcherConfig::from_env(&env).with_workload(WORKLOAD),
        StorefrontContextBuilder::new(Arc::new(SpinTransport)).with_workload(WORKLOAD),
        StorefrontApp,
        StorefrontRedirect::default(),
    );

    let response = dispatcher.fetch(request, &env, &execution).await;
    execution.drain().await;

    Ok(response)
}
