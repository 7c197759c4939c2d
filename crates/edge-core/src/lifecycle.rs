//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Request received, processing started.
    Start,
    /// Per-request application context has been built.
    ContextReady,
    /// The application produced a response.
    Rendered,
    /// A pending session was committed into `Set-Cookie`.
    CookieCommitted,
    /// A 404 was handed to the redirect resolver.
    RedirectChecked,
    /// Request completed successfully.
    Completion,
    /// An error occurred.
    Error(String),
}

impl LifecyclePhase {
    /// Timing mark name for this phase.
    pub fn mark_name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ContextReady => "context_ready",
            Self::Rendered => "rendered",
            Self::CookieCommitted => "cookie_committed",
            Self::RedirectChecked => "redirect_checked",
            Self::Completion => "completion",
            Self::Error(_) => "error",
        }
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Record the mark for a lifecycle phase.
    pub fn mark_phase(&mut self, phase: &LifecyclePhase) {
        self.mark(phase.mark_name());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from start to a recorded mark.
    pub fn time_to(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Time spent inside the application, from context ready to rendered.
    pub fn render_time(&self) -> Option<Duration> {
        let ready = self.marks.get(LifecyclePhase::ContextReady.mark_name())?;
        let rendered = self.marks.get(LifecyclePhase::Rendered.mark_name())?;
        Some(rendered.duration_since(*ready))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called when a lifecycle phase occurs.
    fn on_phase(&self, phase: LifecyclePhase, elapsed: Duration);
}
