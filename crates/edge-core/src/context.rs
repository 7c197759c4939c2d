//! Request-scoped context supplied by the host platform.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use rand::Rng;

use crate::error::CoreError;
use crate::message::{header_names, header_str, Request};

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let mut rng = rand::thread_rng();
        Self(format!(
            "{:x}-{:08x}-{:08x}",
            nanos,
            rng.gen::<u32>(),
            rng.gen::<u32>()
        ))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reuse the caller's `X-Request-ID` if present, otherwise generate one.
    pub fn from_request(request: &Request) -> Self {
        match header_str(request.headers(), header_names::X_REQUEST_ID) {
            Some(id) if !id.trim().is_empty() => Self::from_string(id.trim()),
            _ => Self::generate(),
        }
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only bindings the host platform exposes to the worker
/// (variables, secrets, service names).
///
/// Cloning is cheap; every clone shares the same immutable map.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: Arc<HashMap<String, String>>,
}

impl Env {
    /// Create from an owned map of bindings.
    pub fn new(bindings: HashMap<String, String>) -> Self {
        Self {
            bindings: Arc::new(bindings),
        }
    }

    /// Get a binding, treating empty values as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Get a binding that must be present.
    pub fn require(&self, name: &str) -> Result<&str, CoreError> {
        self.get(name)
            .ok_or_else(|| CoreError::MissingBinding(name.to_string()))
    }

    /// Whether a binding is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<K, V> FromIterator<(K, V)> for Env
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Handle for background work that may outlive the response.
///
/// Work registered with [`ExecutionContext::wait_until`] is not awaited by
/// request handling; the host drains it after the response is sent.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    pending: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
}

impl ExecutionContext {
    /// Create an empty execution context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register background work.
    pub fn wait_until<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(work.boxed());
        }
    }

    /// Number of registered, not yet drained tasks.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Await every task registered so far.
    pub async fn drain(&self) {
        let tasks = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        join_all(tasks).await;
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("pending", &self.pending_count())
            .finish()
    }
}
