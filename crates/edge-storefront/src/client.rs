//! Storefront API GraphQL client.

use std::sync::Arc;

use edge_core::RequestId;
use edge_observability::StructuredLogger;
use http::{header, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{I18nLocale, StorefrontConfig, StorefrontError, StorefrontTransport};

/// Storefront API header names.
pub mod header_names {
    pub const PUBLIC_TOKEN: &str = "x-shopify-storefront-access-token";
    pub const PRIVATE_TOKEN: &str = "shopify-storefront-private-token";
    pub const STOREFRONT_ID: &str = "shopify-storefront-id";
    pub const BUYER_IP: &str = "shopify-storefront-buyer-ip";
    pub const REQUEST_ID: &str = "x-request-id";
}

const REDIRECT_QUERY: &str = r#"query redirects($query: String) {
  urlRedirects(first: 1, query: $query) {
    edges {
      node {
        target
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedirectData {
    url_redirects: Connection<RedirectNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct RedirectNode {
    target: String,
}

/// Storefront API client bound to one request.
///
/// Cheap to clone; the transport is shared.
#[derive(Clone)]
pub struct StorefrontClient {
    config: StorefrontConfig,
    transport: Arc<dyn StorefrontTransport>,
    i18n: I18nLocale,
    buyer_ip: Option<String>,
    request_id: Option<RequestId>,
    logger: Option<StructuredLogger>,
}

impl StorefrontClient {
    /// Create a new client.
    pub fn new(config: StorefrontConfig, transport: Arc<dyn StorefrontTransport>) -> Self {
        Self {
            config,
            transport,
            i18n: I18nLocale::default(),
            buyer_ip: None,
            request_id: None,
            logger: None,
        }
    }

    /// Set the locale injected into `$country` / `$language` variables.
    pub fn with_i18n(mut self, i18n: I18nLocale) -> Self {
        self.i18n = i18n;
        self
    }

    /// Forward the buyer's IP to the API.
    pub fn with_buyer_ip(mut self, ip: impl Into<String>) -> Self {
        self.buyer_ip = Some(ip.into());
        self
    }

    /// Propagate the request ID on outbound calls.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Log through the request's logger.
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Connection settings.
    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Active locale.
    pub fn i18n(&self) -> &I18nLocale {
        &self.i18n
    }

    /// Request logger, if one was attached.
    pub fn logger(&self) -> Option<&StructuredLogger> {
        self.logger.as_ref()
    }

    /// `https://{shop domain}`.
    pub fn shop_origin(&self) -> String {
        self.config.shop_origin()
    }

    /// Run a GraphQL query and deserialize its `data`.
    ///
    /// `$country` and `$language` variables are filled from the locale when
    /// the query declares them and the caller did not.
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, StorefrontError> {
        let url = self.config.graphql_url();
        let body = json!({
            "query": query,
            "variables": self.with_locale_variables(query, variables),
        });

        let request = self.build_request(&url, serde_json::to_vec(&body)?)?;
        let response = self.transport.send(request).await?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(StorefrontError::Http { status, url });
        }

        let parsed: GraphQlResponse<T> = serde_json::from_slice(response.body())?;
        if !parsed.errors.is_empty() {
            return Err(StorefrontError::GraphQl(
                parsed.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        parsed
            .data
            .ok_or_else(|| StorefrontError::Deserialization("response has no data".to_string()))
    }

    /// Look up the shop's URL redirect for a path, if any.
    pub async fn url_redirect(&self, path: &str) -> Result<Option<String>, StorefrontError> {
        let data: RedirectData = self
            .query(REDIRECT_QUERY, json!({ "query": format!("path:{}", path) }))
            .await?;

        Ok(data
            .url_redirects
            .edges
            .into_iter()
            .next()
            .map(|edge| edge.node.target)
            .filter(|target| !target.is_empty()))
    }

    fn with_locale_variables(&self, query: &str, variables: Value) -> Value {
        let mut map = match variables {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return other,
        };
        if query.contains("$country") && !map.contains_key("country") {
            map.insert("country".to_string(), json!(self.i18n.country));
        }
        if query.contains("$language") && !map.contains_key("language") {
            map.insert("language".to_string(), json!(self.i18n.language));
        }
        Value::Object(map)
    }

    fn build_request(
        &self,
        url: &str,
        body: Vec<u8>,
    ) -> Result<edge_core::Request, StorefrontError> {
        let mut builder = http::Request::builder()
            .method(Method::POST)
            .uri(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");

        builder = match &self.config.private_token {
            Some(token) => builder.header(header_names::PRIVATE_TOKEN, token),
            None => builder.header(header_names::PUBLIC_TOKEN, &self.config.public_token),
        };
        if let Some(id) = &self.config.storefront_id {
            builder = builder.header(header_names::STOREFRONT_ID, id);
        }
        if let Some(ip) = &self.buyer_ip {
            builder = builder.header(header_names::BUYER_IP, ip);
        }
        if let Some(request_id) = &self.request_id {
            builder = builder.header(header_names::REQUEST_ID, request_id.as_str());
        }

        builder
            .body(body)
            .map_err(|e| StorefrontError::Transport(e.to_string()))
    }
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("store_domain", &self.config.store_domain)
            .field("api_version", &self.config.api_version)
            .field("i18n", &self.i18n)
            .finish()
    }
}
