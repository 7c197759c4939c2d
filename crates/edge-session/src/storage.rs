//! Cookie-backed session storage.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};

use crate::cookie::CookieOptions;
use crate::{AppSession, SessionError, SessionSecrets};

/// Reads and writes sessions stored entirely in a signed cookie.
#[derive(Debug, Clone)]
pub struct CookieSessionStorage {
    secrets: SessionSecrets,
    options: CookieOptions,
}

impl CookieSessionStorage {
    /// Create storage with default cookie attributes.
    pub fn new(secrets: SessionSecrets) -> Self {
        Self {
            secrets,
            options: CookieOptions::default(),
        }
    }

    /// Override cookie attributes.
    pub fn with_options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }

    /// Cookie attributes in use.
    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    /// Open the session carried by a `Cookie` request header.
    ///
    /// A missing cookie or one whose signature does not verify yields a
    /// fresh, empty session. A correctly signed cookie whose payload cannot
    /// be decoded is an error.
    pub fn get_session(&self, cookie_header: Option<&str>) -> Result<AppSession, SessionError> {
        let raw = cookie_header.and_then(|h| self.options.find_in_header(h));
        let data = match raw.as_deref() {
            Some(raw) => match self.secrets.unsign(raw) {
                Some(payload) => decode_payload(payload)?,
                None => Map::new(),
            },
            None => Map::new(),
        };

        Ok(AppSession::from_parts(data, self.clone()))
    }

    /// Serialize session data into a `Set-Cookie` value.
    pub fn commit_session(&self, data: &Map<String, Value>) -> Result<String, SessionError> {
        let json = serde_json::to_vec(data)?;
        let signed = self.secrets.sign(&URL_SAFE_NO_PAD.encode(json))?;
        let cookie = self.options.serialize(signed);

        if cookie.len() > CookieOptions::MAX_COOKIE_SIZE {
            return Err(SessionError::TooLarge {
                size: cookie.len(),
                limit: CookieOptions::MAX_COOKIE_SIZE,
            });
        }
        Ok(cookie)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn destroy_session(&self) -> String {
        self.options.serialize_expired()
    }
}

fn decode_payload(payload: &str) -> Result<Map<String, Value>, SessionError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| SessionError::Malformed(e.to_string()))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SessionError::Malformed("payload is not an object".to_string())),
        Err(e) => Err(SessionError::Malformed(e.to_string())),
    }
}
