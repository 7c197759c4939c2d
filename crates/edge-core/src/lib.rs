//! Core abstractions for the edge storefront platform.
//!
//! This crate provides the fundamental request-scoped types:
//! - `Request` / `Response` - HTTP message aliases used across the platform
//! - `Env` - Read-only host bindings
//! - `ExecutionContext` - Background work that may outlive the response
//! - `RequestId` - Request correlation identifier
//! - `Mode` - Production vs development behavior
//! - `LifecyclePhase` - Request lifecycle tracking

mod config;
mod context;
mod error;
mod lifecycle;
mod message;

pub use config::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use message::*;
