//! Signed cookie sessions for the edge storefront platform.
//!
//! The whole session lives in one HMAC-signed cookie, so there is no
//! server-side store. Handlers mutate an [`AppSession`] through a shared
//! reference; any mutation marks it pending, and the dispatcher commits it
//! into a `Set-Cookie` header once the response is ready.
//!
//! # Example
//!
//! ```rust,ignore
//! use edge_session::{CookieSessionStorage, SessionSecrets};
//!
//! let secrets = SessionSecrets::from_env(&env)?;
//! let session = CookieSessionStorage::new(secrets).get_session(cookie_header)?;
//!
//! session.set("cart_id", "gid://shopify/Cart/1")?;
//! assert!(session.is_pending());
//!
//! let set_cookie = session.commit()?;
//! ```

mod cookie;
mod error;
mod secrets;
mod session;
mod storage;

pub use cookie::{CookieOptions, SameSite};
pub use error::SessionError;
pub use secrets::{SessionSecrets, SESSION_SECRET_BINDING};
pub use session::AppSession;
pub use storage::CookieSessionStorage;
