//! Session cookie attributes, on top of `biscotti`.

use biscotti::time::SignedDuration;
use biscotti::{
    Processor, ProcessorConfig, RemovalCookie, RequestCookies, ResponseCookie, ResponseCookies,
};

pub use biscotti::SameSite;

/// Attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    /// Cookie name.
    pub name: String,
    /// Cookie path.
    pub path: String,
    /// Hide the cookie from client-side scripts.
    pub http_only: bool,
    /// `SameSite` attribute.
    pub same_site: SameSite,
    /// Only send over HTTPS.
    pub secure: bool,
    /// Lifetime in seconds; `None` makes it a browser-session cookie.
    pub max_age: Option<u64>,
    /// Optional `Domain` attribute.
    pub domain: Option<String>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            path: "/".to_string(),
            http_only: true,
            same_site: SameSite::Lax,
            secure: true,
            max_age: None,
            domain: None,
        }
    }
}

impl CookieOptions {
    /// Browsers drop cookies beyond this size.
    pub const MAX_COOKIE_SIZE: usize = 4096;

    /// Set the cookie name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the cookie lifetime in seconds.
    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age = Some(secs);
        self
    }

    /// Enable or disable the `Secure` attribute.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the `SameSite` attribute.
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set the `Domain` attribute.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// The session cookie carrying `value`, with these attributes.
    pub fn response_cookie(&self, value: String) -> ResponseCookie<'static> {
        let mut cookie = ResponseCookie::new(self.name.clone(), value)
            .set_path(self.path.clone())
            .set_http_only(self.http_only)
            .set_secure(self.secure)
            .set_same_site(self.same_site);
        if let Some(domain) = &self.domain {
            cookie = cookie.set_domain(domain.clone());
        }
        if let Some(secs) = self.max_age {
            let secs = i64::try_from(secs).unwrap_or(i64::MAX);
            cookie = cookie.set_max_age(SignedDuration::from_secs(secs));
        }
        cookie
    }

    /// A cookie that makes the browser drop the session cookie.
    pub fn removal_cookie(&self) -> ResponseCookie<'static> {
        let mut cookie = RemovalCookie::new(self.name.clone()).set_path(self.path.clone());
        if let Some(domain) = &self.domain {
            cookie = cookie.set_domain(domain.clone());
        }
        cookie.into()
    }

    /// `Set-Cookie` value for the session cookie carrying `value`.
    pub fn serialize(&self, value: String) -> String {
        header_value(self.response_cookie(value))
    }

    /// `Set-Cookie` value that clears any stored session.
    pub fn serialize_expired(&self) -> String {
        header_value(self.removal_cookie())
    }

    /// Find the session cookie in a `Cookie` request header.
    ///
    /// A header that does not parse is treated as carrying no session.
    pub fn find_in_header(&self, header: &str) -> Option<String> {
        let processor = processor();
        let mut cookies = RequestCookies::new();
        cookies.extend_from_header(header, &processor).ok()?;
        cookies.get(&self.name).map(|cookie| cookie.value().to_string())
    }
}

/// Session cookies are signed by [`crate::SessionSecrets`], so the
/// processor only handles encoding.
fn processor() -> Processor {
    ProcessorConfig::default().into()
}

fn header_value(cookie: ResponseCookie<'static>) -> String {
    let mut cookies = ResponseCookies::default();
    cookies.insert(cookie);
    cookies
        .header_values(&processor())
        .next()
        .unwrap_or_default()
}
