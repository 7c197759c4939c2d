//! Request dispatcher for the edge storefront platform.
//!
//! For every request the [`Dispatcher`]:
//! 1. builds an [`AppContext`] (session + storefront client),
//! 2. renders the response through the application's [`RequestHandler`],
//! 3. commits a pending session into `Set-Cookie`,
//! 4. hands a 404 to the [`RedirectResolver`],
//!
//! and turns any failure along the way into a 500 response.
//!
//! # Example
//!
//! ```rust,ignore
//! use edge_dispatch::{Dispatcher, DispatcherConfig, StorefrontContextBuilder, StorefrontRedirect};
//!
//! let dispatcher = Dispatcher::new(
//!     DispatcherConfig::from_env(&env).with_workload("storefront"),
//!     StorefrontContextBuilder::new(transport),
//!     MyApp,
//!     StorefrontRedirect::default(),
//! );
//!
//! let response = dispatcher.fetch(request, &env, &execution).await;
//! ```

mod builder;
mod context;
mod dispatcher;
mod error;
mod outcome;
mod resolver;
mod traits;

pub use builder::StorefrontContextBuilder;
pub use context::AppContext;
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::DispatchError;
pub use outcome::{error_response, DispatchOutcome, ErrorDetails, GENERIC_ERROR_MESSAGE};
pub use resolver::{PassThrough, StorefrontRedirect};
pub use traits::{ContextBuilder, RedirectResolver, RequestHandler};

// Re-exported so applications depend on one crate.
pub use edge_core::{Env, ExecutionContext, Mode, Request, RequestId, Response};
pub use edge_session::AppSession;
pub use edge_storefront::{RedirectRequest, StorefrontClient};
