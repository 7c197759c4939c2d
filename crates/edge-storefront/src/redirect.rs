//! Storefront redirect resolution for not-found responses.

use edge_core::{empty_response, Request, Response};
use http::{header, HeaderValue, StatusCode};
use url::Url;

use crate::{StorefrontClient, StorefrontError};

/// Soft-navigation redirect headers understood by the client router.
pub mod header_names {
    pub const X_REMIX_REDIRECT: &str = "x-remix-redirect";
    pub const X_REMIX_STATUS: &str = "x-remix-status";
}

/// Query parameters consumed by redirect resolution.
const RETURN_TO_PARAMS: [&str; 2] = ["return_to", "redirect"];
const SOFT_NAVIGATION_PARAM: &str = "_data";

/// Placeholder origin used to resolve relative redirect targets.
const PLACEHOLDER_ORIGIN: &str = "https://redirect.invalid";

/// Everything the resolver needs to decide on a redirect.
pub struct RedirectRequest<'a> {
    /// The original request.
    pub request: &'a Request,
    /// The not-found response produced by the application.
    pub response: Response,
    /// The request's storefront client.
    pub storefront: &'a StorefrontClient,
}

/// Tuning for [`storefront_redirect`].
#[derive(Debug, Clone, Default)]
pub struct RedirectOptions {
    /// Do not send `/admin` to the shop admin.
    pub no_admin_redirect: bool,
    /// Match redirects on path plus query string instead of path only.
    /// The query is then not forwarded to the target.
    pub match_query_params: bool,
}

/// Resolve a not-found response against the shop's URL redirects.
///
/// Returns the original response when nothing matches. A request URL that
/// cannot be parsed and Storefront API failures are logged and also pass
/// the original response through; only an unusable redirect target is an
/// error.
pub async fn storefront_redirect(
    redirect: RedirectRequest<'_>,
    options: &RedirectOptions,
) -> Result<Response, StorefrontError> {
    let RedirectRequest {
        request,
        response,
        storefront,
    } = redirect;

    let url = match request_url(request) {
        Ok(url) => url,
        Err(e) => {
            if let Some(logger) = storefront.logger() {
                logger
                    .warn_builder("Cannot resolve request URL for storefront redirect")
                    .field("error", e.to_string())
                    .emit();
            }
            return Ok(response);
        }
    };
    let all_params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let is_soft_navigation = all_params.iter().any(|(k, _)| k == SOFT_NAVIGATION_PARAM);
    let forwarded: Vec<(String, String)> = all_params
        .iter()
        .filter(|(k, _)| k != SOFT_NAVIGATION_PARAM && !RETURN_TO_PARAMS.contains(&k.as_str()))
        .cloned()
        .collect();

    let mut redirect_from = url.path().to_string();
    if options.match_query_params && !forwarded.is_empty() {
        redirect_from.push('?');
        redirect_from.push_str(&encode_params(&forwarded));
    }
    let redirect_from = redirect_from.to_lowercase();

    if url.path() == "/admin" && !options.no_admin_redirect {
        let admin = format!("{}/admin", storefront.shop_origin());
        return redirect_response(&admin, &forwarded, is_soft_navigation, false);
    }

    match storefront.url_redirect(&redirect_from).await {
        Ok(Some(target)) => {
            return redirect_response(
                &target,
                &forwarded,
                is_soft_navigation,
                options.match_query_params,
            );
        }
        Ok(None) => {}
        Err(e) => {
            if let Some(logger) = storefront.logger() {
                logger
                    .warn_builder("Unknown error while looking for storefront redirect")
                    .field("error", e.to_string())
                    .field("path", redirect_from.as_str())
                    .emit();
            }
            return Ok(response);
        }
    }

    if let Some(target) = return_to_target(&url, &all_params, storefront) {
        return redirect_response(
            &target,
            &forwarded,
            is_soft_navigation,
            options.match_query_params,
        );
    }

    Ok(response)
}

/// First `return_to` / `redirect` value that stays on the request's origin.
fn return_to_target(
    url: &Url,
    params: &[(String, String)],
    storefront: &StorefrontClient,
) -> Option<String> {
    let target = RETURN_TO_PARAMS
        .iter()
        .find_map(|name| params.iter().find(|(k, _)| k == name))
        .map(|(_, v)| v.clone())
        .filter(|v| !v.is_empty())?;

    if is_local_path(url, &target) {
        Some(target)
    } else {
        if let Some(logger) = storefront.logger() {
            logger
                .warn_builder("Cross-domain redirects are not supported")
                .field("from", url.as_str())
                .field("to", target.as_str())
                .emit();
        }
        None
    }
}

fn is_local_path(base: &Url, target: &str) -> bool {
    base.join(target)
        .map(|resolved| resolved.origin() == base.origin())
        .unwrap_or(false)
}

/// Absolute URL of the request, using `Host` when the URI is origin-form.
pub fn request_url(request: &Request) -> Result<Url, StorefrontError> {
    let uri = request.uri();
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Url::parse(&uri.to_string())
            .map_err(|e| StorefrontError::InvalidRedirect(e.to_string()));
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    Url::parse(&format!("https://{}{}", host, path))
        .map_err(|e| StorefrontError::InvalidRedirect(e.to_string()))
}

fn encode_params(params: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

fn redirect_response(
    location: &str,
    forwarded: &[(String, String)],
    is_soft_navigation: bool,
    match_query_params: bool,
) -> Result<Response, StorefrontError> {
    let placeholder = Url::parse(PLACEHOLDER_ORIGIN)
        .map_err(|e| StorefrontError::InvalidRedirect(e.to_string()))?;
    let mut target = placeholder
        .join(location)
        .map_err(|e| StorefrontError::InvalidRedirect(format!("{}: {}", location, e)))?;

    if !match_query_params && !forwarded.is_empty() {
        target.query_pairs_mut().extend_pairs(forwarded.iter());
    }

    let target = target.to_string();
    let location = target
        .strip_prefix(PLACEHOLDER_ORIGIN)
        .unwrap_or(&target)
        .to_string();
    let value = HeaderValue::from_str(&location)
        .map_err(|e| StorefrontError::InvalidRedirect(e.to_string()))?;

    let response = if is_soft_navigation {
        let mut response = empty_response(StatusCode::OK);
        response
            .headers_mut()
            .insert(header_names::X_REMIX_REDIRECT, value);
        response
            .headers_mut()
            .insert(header_names::X_REMIX_STATUS, HeaderValue::from_static("301"));
        response
    } else {
        let mut response = empty_response(StatusCode::MOVED_PERMANENTLY);
        response.headers_mut().insert(header::LOCATION, value);
        response
    };
    Ok(response)
}
