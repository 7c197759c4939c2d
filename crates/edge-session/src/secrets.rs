//! Session signing secrets.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use edge_core::{CoreError, Env};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Binding holding the session secret(s).
pub const SESSION_SECRET_BINDING: &str = "SESSION_SECRET";

/// Ordered list of HMAC secrets.
///
/// The first secret signs new cookies; every secret is accepted when
/// verifying, so secrets can be rotated without logging everyone out.
#[derive(Clone)]
pub struct SessionSecrets(Vec<String>);

impl SessionSecrets {
    /// Create from an ordered list of secrets. Empty entries are dropped.
    pub fn new<I, S>(secrets: I) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let secrets: Vec<String> = secrets
            .into_iter()
            .map(Into::into)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if secrets.is_empty() {
            return Err(CoreError::MissingBinding(SESSION_SECRET_BINDING.to_string()).into());
        }
        Ok(Self(secrets))
    }

    /// Read `SESSION_SECRET` (comma-separated for rotation).
    pub fn from_env(env: &Env) -> Result<Self, SessionError> {
        let raw = env.require(SESSION_SECRET_BINDING)?;
        Self::new(raw.split(','))
    }

    /// Number of configured secrets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; construction rejects an empty list.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sign `value` with the primary secret, returning `value.signature`.
    pub fn sign(&self, value: &str) -> Result<String, SessionError> {
        let mut mac = mac_for(&self.0[0])?;
        mac.update(value.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", value, signature))
    }

    /// Verify a signed value against every secret, returning the unsigned
    /// part on success.
    pub fn unsign<'a>(&self, signed: &'a str) -> Option<&'a str> {
        let (value, signature) = signed.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        self.0.iter().find_map(|secret| {
            let mut mac = mac_for(secret).ok()?;
            mac.update(value.as_bytes());
            mac.verify_slice(&signature).ok().map(|_| value)
        })
    }
}

impl std::fmt::Debug for SessionSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionSecrets")
            .field(&format!("<{} redacted>", self.0.len()))
            .finish()
    }
}

fn mac_for(secret: &str) -> Result<HmacSha256, SessionError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SessionError::InvalidKey(e.to_string()))
}
