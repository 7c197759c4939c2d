//! Per-request timing summary.

use edge_core::{LifecyclePhase, RequestId, TimingContext};
use serde::Serialize;

/// Metrics for a single dispatched request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetrics {
    /// Request ID for correlation.
    pub request_id: String,
    /// Route path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Time to context ready (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_us: Option<u64>,
    /// Time spent in the application (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_us: Option<u64>,
    /// Total request duration (microseconds).
    pub total_duration_us: u64,
    /// HTTP status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Whether a session cookie was written.
    pub session_committed: bool,
    /// Whether the redirect resolver was consulted.
    pub redirect_checked: bool,
}

impl RequestMetrics {
    /// Summarize a finished request from its timing marks.
    pub fn from_timing(request_id: &RequestId, timing: &TimingContext) -> Self {
        Self {
            request_id: request_id.to_string(),
            route: None,
            context_us: timing
                .time_to(LifecyclePhase::ContextReady.mark_name())
                .map(|d| d.as_micros() as u64),
            render_us: timing.render_time().map(|d| d.as_micros() as u64),
            total_duration_us: timing.elapsed().as_micros() as u64,
            status_code: None,
            session_committed: timing
                .time_to(LifecyclePhase::CookieCommitted.mark_name())
                .is_some(),
            redirect_checked: timing
                .time_to(LifecyclePhase::RedirectChecked.mark_name())
                .is_some(),
        }
    }

    /// Set the route path.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Set the final status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Serialize for a structured log field.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_timing_flags() {
        let mut timing = TimingContext::new();
        timing.mark_phase(&LifecyclePhase::ContextReady);
        timing.mark_phase(&LifecyclePhase::Rendered);
        timing.mark_phase(&LifecyclePhase::CookieCommitted);

        let metrics = RequestMetrics::from_timing(&RequestId::from_string("r"), &timing)
            .with_route("/")
            .with_status(200);

        assert!(metrics.context_us.is_some());
        assert!(metrics.render_us.is_some());
        assert!(metrics.session_committed);
        assert!(!metrics.redirect_checked);

        let json = metrics.to_json_value();
        assert_eq!(json["status_code"], 200);
        assert_eq!(json["route"], "/");
    }
}
