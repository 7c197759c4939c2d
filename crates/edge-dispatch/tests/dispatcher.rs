//! End-to-end dispatcher behavior with in-memory collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use edge_core::{LifecycleObserver, LifecyclePhase};
use edge_dispatch::{
    AppContext, ContextBuilder, Dispatcher, DispatcherConfig, Env, ExecutionContext, Mode,
    PassThrough, RedirectRequest, RedirectResolver, Request, RequestHandler, RequestId, Response,
    StorefrontRedirect, GENERIC_ERROR_MESSAGE,
};
use edge_session::{CookieSessionStorage, SessionSecrets};
use edge_storefront::{StorefrontClient, StorefrontConfig, StorefrontError, StorefrontTransport};
use http::{header, StatusCode};

const SECRET: &str = "integration-secret";

struct OfflineTransport;

#[async_trait]
impl StorefrontTransport for OfflineTransport {
    async fn send(&self, _request: Request) -> Result<Response, StorefrontError> {
        Err(StorefrontError::Transport("offline".to_string()))
    }
}

fn storage() -> CookieSessionStorage {
    CookieSessionStorage::new(SessionSecrets::new([SECRET]).unwrap())
}

/// Builds contexts from the request's cookie, or fails on demand.
#[derive(Default)]
struct TestContextBuilder {
    fail_with: Option<&'static str>,
}

#[async_trait]
impl ContextBuilder for TestContextBuilder {
    async fn build_context(
        &self,
        request: &Request,
        env: &Env,
        execution: &ExecutionContext,
        mode: Mode,
    ) -> anyhow::Result<AppContext> {
        if let Some(message) = self.fail_with {
            return Err(anyhow!(message));
        }

        let cookie = request
            .headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok());
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .expect("dispatcher tags requests");

        Ok(AppContext::new(
            request_id,
            storage().get_session(cookie)?,
            StorefrontClient::new(
                StorefrontConfig::new("demo.myshopify.com", "pub"),
                Arc::new(OfflineTransport),
            ),
            env.clone(),
            execution.clone(),
            mode,
        ))
    }
}

/// What the fake application does with the session.
#[derive(Clone, Copy, Default)]
enum SessionWrite {
    #[default]
    None,
    Small,
    Oversized,
}

#[derive(Default)]
struct TestApp {
    status: u16,
    session: SessionWrite,
    own_cookie: bool,
    fail: bool,
    panic: bool,
    calls: AtomicUsize,
}

impl TestApp {
    fn status(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

#[async_trait]
impl RequestHandler for TestApp {
    async fn handle(&self, request: &Request, context: &AppContext) -> anyhow::Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("loader exploded").context("render failed"));
        }
        if self.panic {
            let lines: Vec<&str> = Vec::new();
            return Ok(Response::new(lines[0].as_bytes().to_vec()));
        }

        match self.session {
            SessionWrite::None => {}
            SessionWrite::Small => context.session.set("visited", request.uri().path())?,
            SessionWrite::Oversized => context.session.set("blob", "x".repeat(8192))?,
        }

        let mut builder = http::Response::builder()
            .status(self.status)
            .header("x-app", "test")
            .header("x-seen-request-id", context.request_id.as_str())
            .header("x-seen-mode", context.mode.as_str());
        if self.own_cookie {
            builder = builder.header(header::SET_COOKIE, "app=1");
        }
        Ok(builder.body(format!("body for {}", request.uri().path()).into_bytes())?)
    }
}

#[derive(Clone, Copy)]
enum ResolverMode {
    PassThrough,
    Replace,
    Fail,
}

struct RecordingResolver {
    mode: ResolverMode,
    seen: Mutex<Vec<(String, u16, Vec<u8>)>>,
}

impl RecordingResolver {
    fn new(mode: ResolverMode) -> Self {
        Self {
            mode,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl RedirectResolver for RecordingResolver {
    async fn resolve(&self, redirect: RedirectRequest<'_>) -> anyhow::Result<Response> {
        self.seen.lock().unwrap().push((
            redirect.request.uri().to_string(),
            redirect.response.status().as_u16(),
            redirect.response.body().clone(),
        ));
        match self.mode {
            ResolverMode::PassThrough => Ok(redirect.response),
            ResolverMode::Replace => Ok(http::Response::builder()
                .status(StatusCode::MOVED_PERMANENTLY)
                .header(header::LOCATION, "/collections/all")
                .body(Vec::new())?),
            ResolverMode::Fail => Err(anyhow!("redirect lookup failed")),
        }
    }
}

fn dispatcher<H: RequestHandler, R: RedirectResolver>(
    mode: Mode,
    builder: TestContextBuilder,
    app: H,
    resolver: R,
) -> Dispatcher<TestContextBuilder, H, R> {
    Dispatcher::new(
        DispatcherConfig::new(mode).with_workload("test"),
        builder,
        app,
        resolver,
    )
}

fn get(path: &str) -> Request {
    http::Request::builder().uri(path).body(Vec::new()).unwrap()
}

async fn fetch<H: RequestHandler, R: RedirectResolver>(
    dispatcher: &Dispatcher<TestContextBuilder, H, R>,
    request: Request,
) -> Response {
    dispatcher
        .fetch(request, &Env::default(), &ExecutionContext::new())
        .await
}

#[tokio::test]
async fn test_plain_response_is_returned_unchanged() {
    let d = dispatcher(
        Mode::Development,
        TestContextBuilder::default(),
        TestApp::status(200),
        RecordingResolver::new(ResolverMode::Replace),
    );

    let response = fetch(&d, get("/products/shoe")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), b"body for /products/shoe");
    assert_eq!(response.headers()["x-app"], "test");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(response.headers().get("x-request-id").is_none());
    assert_eq!(response.headers().len(), 3);
}

#[tokio::test]
async fn test_pending_session_sets_cookie() {
    let app = TestApp {
        status: 200,
        session: SessionWrite::Small,
        ..Default::default()
    };
    let d = dispatcher(
        Mode::Production,
        TestContextBuilder::default(),
        app,
        PassThrough,
    );

    let response = fetch(&d, get("/cart")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
    assert_eq!(cookies.len(), 1);

    // The cookie must carry the committed session.
    let set_cookie = cookies[0].to_str().unwrap();
    let request_cookie = set_cookie.split(';').next().unwrap();
    let reopened = storage().get_session(Some(request_cookie)).unwrap();
    assert_eq!(
        reopened.get_as::<String>("visited").unwrap().as_deref(),
        Some("/cart")
    );
}

#[tokio::test]
async fn test_session_cookie_replaces_application_cookie() {
    let app = TestApp {
        status: 200,
        session: SessionWrite::Small,
        own_cookie: true,
        ..Default::default()
    };
    let d = dispatcher(
        Mode::Development,
        TestContextBuilder::default(),
        app,
        PassThrough,
    );

    let response = fetch(&d, get("/")).await;
    let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].to_str().unwrap().starts_with("session="));
}

#[tokio::test]
async fn test_pending_session_on_not_found() {
    let app = TestApp {
        status: 404,
        session: SessionWrite::Small,
        ..Default::default()
    };
    let resolver = RecordingResolver::new(ResolverMode::PassThrough);
    let d = dispatcher(Mode::Development, TestContextBuilder::default(), app, resolver);

    let response = fetch(&d, get("/missing")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn test_not_found_without_redirect_passes_through() {
    let resolver = Arc::new(RecordingResolver::new(ResolverMode::PassThrough));
    let d = dispatcher(
        Mode::Development,
        TestContextBuilder::default(),
        TestApp::status(404),
        SharedResolver(resolver.clone()),
    );

    let response = fetch(&d, get("/missing?x=1")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body(), b"body for /missing");
    assert_eq!(response.headers()["x-app"], "test");

    let seen = resolver.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "/missing?x=1");
    assert_eq!(seen[0].1, 404);
    assert_eq!(seen[0].2, b"body for /missing".to_vec());
}

#[tokio::test]
async fn test_not_found_with_redirect_is_replaced() {
    let d = dispatcher(
        Mode::Development,
        TestContextBuilder::default(),
        TestApp::status(404),
        RecordingResolver::new(ResolverMode::Replace),
    );

    let response = fetch(&d, get("/old-collection")).await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()[header::LOCATION], "/collections/all");
}

#[tokio::test]
async fn test_other_statuses_skip_resolver() {
    for status in [200u16, 301, 410, 500] {
        let resolver = Arc::new(RecordingResolver::new(ResolverMode::Replace));
        let d = dispatcher(
            Mode::Development,
            TestContextBuilder::default(),
            TestApp::status(status),
            SharedResolver(resolver.clone()),
        );

        let response = fetch(&d, get("/")).await;
        assert_eq!(response.status().as_u16(), status);
        assert_eq!(resolver.calls(), 0);
    }
}

#[tokio::test]
async fn test_context_failure_in_production() {
    let builder = TestContextBuilder {
        fail_with: Some("bad session"),
        ..Default::default()
    };
    let app = Arc::new(TestApp::status(200));
    let d = dispatcher(Mode::Production, builder, SharedApp(app.clone()), PassThrough);

    let response = fetch(&d, get("/")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), GENERIC_ERROR_MESSAGE.as_bytes());
    assert_eq!(app.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_context_failure_in_development() {
    let builder = TestContextBuilder {
        fail_with: Some("bad session"),
        ..Default::default()
    };
    let d = dispatcher(Mode::Development, builder, TestApp::status(200), PassThrough);

    let response = fetch(&d, get("/")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(json["error"], GENERIC_ERROR_MESSAGE);
    assert_eq!(json["message"], "bad session");
    assert!(json["stack"].as_str().unwrap().starts_with("ContextError"));
}

#[tokio::test]
async fn test_render_failure_is_500_and_handler_runs_once() {
    let app = Arc::new(TestApp {
        fail: true,
        ..Default::default()
    });
    let d = dispatcher(
        Mode::Development,
        TestContextBuilder::default(),
        SharedApp(app.clone()),
        PassThrough,
    );

    let response = fetch(&d, get("/")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(json["message"], "render failed");
    assert!(json["stack"].as_str().unwrap().contains("loader exploded"));
    assert_eq!(app.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_commit_failure_is_500() {
    let app = TestApp {
        status: 200,
        session: SessionWrite::Oversized,
        ..Default::default()
    };
    let d = dispatcher(Mode::Production, TestContextBuilder::default(), app, PassThrough);

    let response = fetch(&d, get("/")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), GENERIC_ERROR_MESSAGE.as_bytes());
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_redirect_failure_is_500() {
    let d = dispatcher(
        Mode::Development,
        TestContextBuilder::default(),
        TestApp::status(404),
        RecordingResolver::new(ResolverMode::Fail),
    );

    let response = fetch(&d, get("/gone")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(json["message"], "redirect lookup failed");
}

#[tokio::test]
async fn test_error_response_carries_request_id() {
    let builder = TestContextBuilder {
        fail_with: Some("boom"),
        ..Default::default()
    };
    let d = dispatcher(Mode::Production, builder, TestApp::status(200), PassThrough);

    let request = http::Request::builder()
        .uri("/")
        .header("x-request-id", "req-123")
        .body(Vec::new())
        .unwrap();
    let response = fetch(&d, request).await;
    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_panicking_application_is_500() {
    let app = TestApp {
        status: 200,
        panic: true,
        ..Default::default()
    };
    let d = dispatcher(Mode::Production, TestContextBuilder::default(), app, PassThrough);

    let request = http::Request::builder()
        .uri("/cart")
        .header("x-request-id", "req-panic")
        .body(Vec::new())
        .unwrap();
    let response = fetch(&d, request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), GENERIC_ERROR_MESSAGE.as_bytes());
    assert_eq!(response.headers()["x-request-id"], "req-panic");
}

#[tokio::test]
async fn test_panicking_application_in_development() {
    let app = TestApp {
        status: 200,
        panic: true,
        ..Default::default()
    };
    let d = dispatcher(Mode::Development, TestContextBuilder::default(), app, PassThrough);

    let response = fetch(&d, get("/")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert!(json["message"].as_str().unwrap().starts_with("panicked: index out of bounds"));
    assert!(json["stack"].as_str().unwrap().starts_with("PanicError"));
}

#[tokio::test]
async fn test_dispatcher_survives_a_panic() {
    let app = Arc::new(TestApp {
        status: 200,
        panic: true,
        ..Default::default()
    });
    let d = dispatcher(
        Mode::Production,
        TestContextBuilder::default(),
        SharedApp(app.clone()),
        PassThrough,
    );

    fetch(&d, get("/a")).await;
    let response = fetch(&d, get("/b")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_context_mode_matches_dispatcher_mode() {
    for mode in [Mode::Production, Mode::Development] {
        let d = dispatcher(mode, TestContextBuilder::default(), TestApp::status(200), PassThrough);
        let env: Env = [("NODE_ENV", "staging")].into_iter().collect();

        let response = d.fetch(get("/"), &env, &ExecutionContext::new()).await;
        assert_eq!(response.headers()["x-seen-mode"], mode.as_str());
    }
}

#[tokio::test]
async fn test_storefront_redirect_with_unparseable_host() {
    let d = dispatcher(
        Mode::Production,
        TestContextBuilder::default(),
        TestApp::status(404),
        StorefrontRedirect::default(),
    );

    let request = http::Request::builder()
        .uri("/old-page")
        .header(header::HOST, "bad host")
        .body(Vec::new())
        .unwrap();
    let response = fetch(&d, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body(), b"body for /old-page");
}

#[tokio::test]
async fn test_request_id_reaches_application() {
    let d = dispatcher(
        Mode::Development,
        TestContextBuilder::default(),
        TestApp::status(200),
        PassThrough,
    );

    let request = http::Request::builder()
        .uri("/")
        .header("x-request-id", "trace-7")
        .body(Vec::new())
        .unwrap();
    let response = fetch(&d, request).await;
    assert_eq!(response.headers()["x-seen-request-id"], "trace-7");
}

#[tokio::test]
async fn test_dispatches_are_independent() {
    let app = TestApp {
        status: 200,
        session: SessionWrite::Small,
        ..Default::default()
    };
    let builder = TestContextBuilder::default();
    let d = dispatcher(Mode::Development, builder, app, PassThrough);

    let first = fetch(&d, get("/a")).await;
    let second = fetch(&d, get("/b")).await;

    let reopen = |response: &Response| {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let cookie = set_cookie.split(';').next().unwrap().to_string();
        storage()
            .get_session(Some(&cookie))
            .unwrap()
            .get_as::<String>("visited")
            .unwrap()
    };

    assert_eq!(reopen(&first).as_deref(), Some("/a"));
    assert_eq!(reopen(&second).as_deref(), Some("/b"));
}

#[tokio::test]
async fn test_existing_session_is_read_not_rewritten() {
    let session = storage().get_session(None).unwrap();
    session.set("cart", "gid://shopify/Cart/9").unwrap();
    let set_cookie = session.commit().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let d = dispatcher(
        Mode::Development,
        TestContextBuilder::default(),
        TestApp::status(200),
        PassThrough,
    );
    let request = http::Request::builder()
        .uri("/")
        .header(header::COOKIE, cookie)
        .body(Vec::new())
        .unwrap();

    let response = fetch(&d, request).await;
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[derive(Default)]
struct PhaseLog(Mutex<Vec<LifecyclePhase>>);

impl LifecycleObserver for PhaseLog {
    fn on_phase(&self, phase: LifecyclePhase, _elapsed: Duration) {
        self.0.lock().unwrap().push(phase);
    }
}

#[tokio::test]
async fn test_lifecycle_phases() {
    let log = Arc::new(PhaseLog::default());
    let app = TestApp {
        status: 404,
        session: SessionWrite::Small,
        ..Default::default()
    };
    let d = dispatcher(Mode::Development, TestContextBuilder::default(), app, PassThrough)
        .with_observer(log.clone());

    fetch(&d, get("/x")).await;

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            LifecyclePhase::Start,
            LifecyclePhase::ContextReady,
            LifecyclePhase::Rendered,
            LifecyclePhase::CookieCommitted,
            LifecyclePhase::RedirectChecked,
            LifecyclePhase::Completion,
        ]
    );
}

#[tokio::test]
async fn test_lifecycle_error_phase() {
    let log = Arc::new(PhaseLog::default());
    let builder = TestContextBuilder {
        fail_with: Some("bad session"),
        ..Default::default()
    };
    let d = dispatcher(Mode::Production, builder, TestApp::status(200), PassThrough)
        .with_observer(log.clone());

    fetch(&d, get("/")).await;

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            LifecyclePhase::Start,
            LifecyclePhase::Error("bad session".to_string()),
        ]
    );
}

/// Lets a test keep a handle on the application after moving it into the dispatcher.
struct SharedApp(Arc<TestApp>);

#[async_trait]
impl RequestHandler for SharedApp {
    async fn handle(&self, request: &Request, context: &AppContext) -> anyhow::Result<Response> {
        self.0.handle(request, context).await
    }
}

/// Lets a test inspect the resolver after moving it into the dispatcher.
struct SharedResolver(Arc<RecordingResolver>);

#[async_trait]
impl RedirectResolver for SharedResolver {
    async fn resolve(&self, redirect: RedirectRequest<'_>) -> anyhow::Result<Response> {
        self.0.resolve(redirect).await
    }
}
