//! Storefront API configuration from host bindings.

use edge_core::{CoreError, Env};

/// Storefront API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2025-01";

/// Binding names read by [`StorefrontConfig::from_env`].
pub mod bindings {
    pub const STORE_DOMAIN: &str = "PUBLIC_STORE_DOMAIN";
    pub const PUBLIC_TOKEN: &str = "PUBLIC_STOREFRONT_API_TOKEN";
    pub const PRIVATE_TOKEN: &str = "PRIVATE_STOREFRONT_API_TOKEN";
    pub const API_VERSION: &str = "PUBLIC_STOREFRONT_API_VERSION";
    pub const STOREFRONT_ID: &str = "PUBLIC_STOREFRONT_ID";
}

/// Connection settings for one shop.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Shop domain without scheme (e.g. `shop.myshopify.com`).
    pub store_domain: String,
    /// Public access token.
    pub public_token: String,
    /// Private (server-to-server) token, preferred when present.
    pub private_token: Option<String>,
    /// API version, e.g. `2025-01`.
    pub api_version: String,
    /// Storefront identifier forwarded for analytics.
    pub storefront_id: Option<String>,
}

impl StorefrontConfig {
    /// Create a config with the default API version and no private token.
    pub fn new(store_domain: impl Into<String>, public_token: impl Into<String>) -> Self {
        Self {
            store_domain: normalize_domain(&store_domain.into()),
            public_token: public_token.into(),
            private_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            storefront_id: None,
        }
    }

    /// Read the config from host bindings.
    pub fn from_env(env: &Env) -> Result<Self, CoreError> {
        let domain = env.require(bindings::STORE_DOMAIN)?;
        let token = env.require(bindings::PUBLIC_TOKEN)?;

        let mut config = Self::new(domain, token);
        if config.store_domain.is_empty() {
            return Err(CoreError::InvalidBinding {
                name: bindings::STORE_DOMAIN.to_string(),
                reason: "domain is empty".to_string(),
            });
        }
        config.private_token = env.get(bindings::PRIVATE_TOKEN).map(String::from);
        config.storefront_id = env.get(bindings::STOREFRONT_ID).map(String::from);
        if let Some(version) = env.get(bindings::API_VERSION) {
            config.api_version = version.to_string();
        }
        Ok(config)
    }

    /// Set the private token.
    pub fn with_private_token(mut self, token: impl Into<String>) -> Self {
        self.private_token = Some(token.into());
        self
    }

    /// `https://{domain}`.
    pub fn shop_origin(&self) -> String {
        format!("https://{}", self.store_domain)
    }

    /// GraphQL endpoint for the configured version.
    pub fn graphql_url(&self) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            self.store_domain, self.api_version
        )
    }
}

/// Strip scheme and trailing slashes.
fn normalize_domain(domain: &str) -> String {
    domain
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}
