//! Routes served by the reference storefront.

use async_trait::async_trait;
use edge_core::{body_response, Request, Response};
use edge_dispatch::{AppContext, RequestHandler};
use http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

const CART_COUNT_KEY: &str = "cart_count";
const NOTICE_KEY: &str = "notice";

const PRODUCT_QUERY: &str = r#"query Product(
  $handle: String!
  $country: CountryCode
  $language: LanguageCode
) @inContext(country: $country, language: $language) {
  product(handle: $handle) {
    title
    description
  }
}"#;

#[derive(Debug, Deserialize)]
struct ProductData {
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    title: String,
    #[serde(default)]
    description: String,
}

/// The reference application: a home page, product pages and a
/// session-backed cart counter.
#[derive(Debug, Default)]
pub struct StorefrontApp;

#[async_trait]
impl RequestHandler for StorefrontApp {
    async fn handle(&self, request: &Request, context: &AppContext) -> anyhow::Result<Response> {
        let path = strip_locale_prefix(
            request.uri().path(),
            &context.storefront.i18n().path_prefix,
        );

        match (request.method(), path) {
            (&Method::GET, "/") => Ok(home(context)),
            (&Method::GET, p) if p.starts_with("/products/") => {
                product(context, &p["/products/".len()..]).await
            }
            (&Method::GET, "/cart") => cart(context),
            (&Method::POST, "/cart") => add_to_cart(context),
            _ => Ok(not_found()),
        }
    }
}

/// Locale prefixes are routing-transparent and matched without regard to case.
fn strip_locale_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    match path.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => match &path[prefix.len()..] {
            "" => "/",
            rest if rest.starts_with('/') => rest,
            _ => path,
        },
        _ => path,
    }
}

fn home(context: &AppContext) -> Response {
    let locale = context.storefront.i18n();
    html(
        StatusCode::OK,
        format!(
            "<h1>Welcome</h1><p>Locale: {}-{}</p>",
            locale.language, locale.country
        ),
    )
}

async fn product(context: &AppContext, handle: &str) -> anyhow::Result<Response> {
    if handle.is_empty() || handle.contains('/') {
        return Ok(not_found());
    }

    let data: ProductData = context
        .storefront
        .query(PRODUCT_QUERY, json!({ "handle": handle }))
        .await?;

    Ok(match data.product {
        Some(product) => html(
            StatusCode::OK,
            format!(
                "<h1>{}</h1><p>{}</p>",
                escape(&product.title),
                escape(&product.description)
            ),
        ),
        None => not_found(),
    })
}

fn cart(context: &AppContext) -> anyhow::Result<Response> {
    let count: u64 = context.session.get_as(CART_COUNT_KEY)?.unwrap_or(0);
    let notice: Option<String> = context.session.get_as(NOTICE_KEY)?;

    json_response(json!({ "count": count, "notice": notice }))
}

fn add_to_cart(context: &AppContext) -> anyhow::Result<Response> {
    let count: u64 = context.session.get_as(CART_COUNT_KEY)?.unwrap_or(0) + 1;
    context.session.set(CART_COUNT_KEY, count)?;
    context.session.flash(NOTICE_KEY, "Added to cart")?;

    json_response(json!({ "count": count }))
}

fn not_found() -> Response {
    html(StatusCode::NOT_FOUND, "<h1>Not Found</h1>".to_string())
}

fn html(status: StatusCode, body: String) -> Response {
    body_response(status, "text/html; charset=utf-8", body)
}

fn json_response(value: serde_json::Value) -> anyhow::Result<Response> {
    Ok(body_response(
        StatusCode::OK,
        "application/json",
        serde_json::to_vec(&value)?,
    ))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
