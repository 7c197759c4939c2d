//! HTTP message types shared by every platform crate.

use ::http::{header, HeaderValue, StatusCode};

/// Inbound request with a fully buffered body.
pub type Request = ::http::Request<Vec<u8>>;

/// Outbound response with a fully buffered body.
pub type Response = ::http::Response<Vec<u8>>;

/// Header names used by the platform that `http::header` does not define.
pub mod header_names {
    /// Request ID for tracing.
    pub const X_REQUEST_ID: &str = "x-request-id";
    /// Client IP as reported by the edge proxy.
    pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";
    /// Client IP chain as reported by intermediate proxies.
    pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
}

/// Build a response with the given status and an empty body.
pub fn empty_response(status: StatusCode) -> Response {
    let mut response = Response::new(Vec::new());
    *response.status_mut() = status;
    response
}

/// Build a response with a body and an explicit content type.
pub fn body_response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Vec<u8>>,
) -> Response {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Read a header as UTF-8, ignoring values that are not valid strings.
pub fn header_str<'a>(headers: &'a ::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
