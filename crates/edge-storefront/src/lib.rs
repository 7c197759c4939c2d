//! Storefront API access for the edge storefront platform.
//!
//! - `StorefrontClient` - GraphQL client bound to one request
//! - `StorefrontTransport` - Host-provided outbound HTTP
//! - `I18nLocale` - Locale derived from the request path
//! - `storefront_redirect` - Resolve a 404 against the shop's URL redirects

mod client;
mod config;
mod error;
mod i18n;
mod redirect;
mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use i18n::*;
pub use redirect::*;
pub use transport::*;
