//! The dispatcher's single error boundary.

use edge_core::{body_response, Mode, Response};
use http::StatusCode;
use serde::Serialize;

use crate::DispatchError;

/// Body of every production error response, and the `error` field of
/// development ones.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Result of handling one request.
///
/// Every path through the dispatcher ends here, and both variants convert
/// into a response.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The application (or redirect resolver) produced a response.
    Success(Response),
    /// Handling failed somewhere.
    Failure(DispatchError),
}

impl DispatchOutcome {
    /// Convert into the response sent to the client.
    pub fn into_response(self, mode: Mode) -> Response {
        match self {
            Self::Success(response) => response,
            Self::Failure(error) => error_response(mode, &error),
        }
    }

    /// Check for failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl From<Result<Response, DispatchError>> for DispatchOutcome {
    fn from(result: Result<Response, DispatchError>) -> Self {
        match result {
            Ok(response) => Self::Success(response),
            Err(error) => Self::Failure(error),
        }
    }
}

/// What gets logged (and, outside production, returned) for a failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetails {
    /// Display of the error.
    pub message: String,
    /// The error followed by its causes, one per line.
    pub stack: String,
    /// Stage that failed.
    pub name: String,
}

impl ErrorDetails {
    /// Collect details from a dispatch error.
    pub fn from_error(error: &DispatchError) -> Self {
        let message = error.to_string();
        let mut stack = format!("{}: {}", error.name(), message);
        for cause in error.inner().chain().skip(1) {
            stack.push_str(&format!("\n    caused by: {}", cause));
        }

        Self {
            message,
            stack,
            name: error.name().to_string(),
        }
    }
}

#[derive(Serialize)]
struct DiagnosticBody<'a> {
    error: &'static str,
    message: &'a str,
    stack: &'a str,
}

/// Synthesize the 500 response for a failure.
///
/// Development gets a pretty-printed JSON diagnostic; production gets only
/// the generic message.
pub fn error_response(mode: Mode, error: &DispatchError) -> Response {
    if mode.is_production() {
        return body_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain; charset=utf-8",
            GENERIC_ERROR_MESSAGE,
        );
    }

    let details = ErrorDetails::from_error(error);
    let body = DiagnosticBody {
        error: GENERIC_ERROR_MESSAGE,
        message: &details.message,
        stack: &details.stack,
    };
    match serde_json::to_vec_pretty(&body) {
        Ok(json) => body_response(StatusCode::INTERNAL_SERVER_ERROR, "application/json", json),
        Err(_) => body_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain; charset=utf-8",
            GENERIC_ERROR_MESSAGE,
        ),
    }
}
