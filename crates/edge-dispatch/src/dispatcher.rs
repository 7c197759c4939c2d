//! The per-request dispatcher.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use edge_core::{
    header_names, Env, ExecutionContext, LifecycleObserver, LifecyclePhase, Mode, Request,
    RequestId, Response, TimingContext,
};
use edge_observability::{RequestMetrics, StructuredLogger};
use edge_storefront::RedirectRequest;
use futures::FutureExt;
use http::{header, HeaderValue, StatusCode};

use crate::{
    AppContext, ContextBuilder, DispatchError, DispatchOutcome, ErrorDetails, RedirectResolver,
    RequestHandler,
};

/// Static dispatcher settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Selects error verbosity and log format.
    pub mode: Mode,
    /// Workload name attached to logs.
    pub workload: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            workload: "storefront".to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Create a config for a mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Read the mode from host bindings, once.
    pub fn from_env(env: &Env) -> Self {
        Self::new(Mode::from_env(env))
    }

    /// Set the workload name.
    pub fn with_workload(mut self, workload: impl Into<String>) -> Self {
        self.workload = workload.into();
        self
    }
}

/// Binds an application to the host's per-request fetch hook.
///
/// Holds only immutable configuration and collaborators, so one instance
/// can serve any number of concurrent requests.
pub struct Dispatcher<C, H, R> {
    config: DispatcherConfig,
    context_builder: C,
    handler: H,
    resolver: R,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl<C, H, R> Dispatcher<C, H, R>
where
    C: ContextBuilder,
    H: RequestHandler,
    R: RedirectResolver,
{
    /// Create a dispatcher.
    pub fn new(config: DispatcherConfig, context_builder: C, handler: H, resolver: R) -> Self {
        Self {
            config,
            context_builder,
            handler,
            resolver,
            observer: None,
        }
    }

    /// Report lifecycle phases to an observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Handle one request. Never fails: every error, and every panic that
    /// unwinds, becomes a 500.
    pub async fn fetch(
        &self,
        mut request: Request,
        env: &Env,
        execution: &ExecutionContext,
    ) -> Response {
        let request_id = RequestId::from_request(&request);
        request.extensions_mut().insert(request_id.clone());

        let route = request.uri().path().to_string();
        let logger = StructuredLogger::for_mode(request_id.clone(), self.config.mode)
            .with_workload(self.config.workload.as_str())
            .with_route(route.as_str());
        let mut timing = TimingContext::new();

        self.phase(LifecyclePhase::Start, &mut timing);
        logger
            .debug_builder("Request started")
            .field("method", request.method().as_str())
            .emit();

        let outcome: DispatchOutcome =
            AssertUnwindSafe(self.dispatch(&request, env, execution, &logger, &mut timing))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(DispatchError::Panic(anyhow!(panic_message(&*panic))))
                })
                .into();

        let failed = outcome.is_failure();
        if let DispatchOutcome::Failure(error) = &outcome {
            let details = ErrorDetails::from_error(error);
            self.phase(LifecyclePhase::Error(details.message.clone()), &mut timing);
            logger
                .error_builder("Server error")
                .field("message", details.message)
                .field("stack", details.stack)
                .field("name", details.name)
                .emit();
        } else {
            self.phase(LifecyclePhase::Completion, &mut timing);
        }

        let mut response = outcome.into_response(self.config.mode);
        // Only synthesized responses are tagged; application responses pass through as-is.
        if failed {
            if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                response
                    .headers_mut()
                    .insert(header_names::X_REQUEST_ID, value);
            }
        }

        let metrics = RequestMetrics::from_timing(&request_id, &timing)
            .with_route(route)
            .with_status(response.status().as_u16());
        logger
            .info_builder("Request completed")
            .field_i64("status", i64::from(response.status().as_u16()))
            .field_json("metrics", metrics.to_json_value())
            .emit();

        response
    }

    async fn dispatch(
        &self,
        request: &Request,
        env: &Env,
        execution: &ExecutionContext,
        logger: &StructuredLogger,
        timing: &mut TimingContext,
    ) -> Result<Response, DispatchError> {
        let context = self
            .context_builder
            .build_context(request, env, execution, self.config.mode)
            .await
            .map_err(DispatchError::Context)?;
        self.phase(LifecyclePhase::ContextReady, timing);

        let mut response = self
            .handler
            .handle(request, &context)
            .await
            .map_err(DispatchError::Render)?;
        self.phase(LifecyclePhase::Rendered, timing);

        if self.commit_session(&context, &mut response)? {
            self.phase(LifecyclePhase::CookieCommitted, timing);
        }

        if response.status() == StatusCode::NOT_FOUND {
            logger.info("Not found, checking storefront redirects");
            let resolved = self
                .resolver
                .resolve(RedirectRequest {
                    request,
                    response,
                    storefront: &context.storefront,
                })
                .await
                .map_err(DispatchError::Redirect)?;
            self.phase(LifecyclePhase::RedirectChecked, timing);
            return Ok(resolved);
        }

        Ok(response)
    }

    /// Install the committed session cookie. Returns whether one was set.
    fn commit_session(
        &self,
        context: &AppContext,
        response: &mut Response,
    ) -> Result<bool, DispatchError> {
        if !context.session.is_pending() {
            return Ok(false);
        }

        let cookie = context
            .session
            .commit()
            .map_err(|e| DispatchError::Commit(e.into()))?;
        let value =
            HeaderValue::from_str(&cookie).map_err(|e| DispatchError::Commit(e.into()))?;
        response.headers_mut().insert(header::SET_COOKIE, value);
        Ok(true)
    }

    fn phase(&self, phase: LifecyclePhase, timing: &mut TimingContext) {
        timing.mark_phase(&phase);
        if let Some(observer) = &self.observer {
            observer.on_phase(phase, timing.elapsed());
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
