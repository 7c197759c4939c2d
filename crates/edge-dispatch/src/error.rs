//! Dispatch error types.

/// A failure anywhere in request handling.
///
/// Each variant records where the failure happened; all of them end in a
/// 500 response.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Building the per-request context failed.
    #[error(transparent)]
    Context(anyhow::Error),

    /// The application failed to produce a response.
    #[error(transparent)]
    Render(anyhow::Error),

    /// Committing the pending session failed.
    #[error(transparent)]
    Commit(anyhow::Error),

    /// The redirect resolver failed.
    #[error(transparent)]
    Redirect(anyhow::Error),

    /// A collaborator panicked while the request was in flight.
    #[error(transparent)]
    Panic(anyhow::Error),
}

impl DispatchError {
    /// Short name of the failing stage, used as the error's `name`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Context(_) => "ContextError",
            Self::Render(_) => "RenderError",
            Self::Commit(_) => "CommitError",
            Self::Redirect(_) => "RedirectError",
            Self::Panic(_) => "PanicError",
        }
    }

    /// The wrapped error.
    pub fn inner(&self) -> &anyhow::Error {
        match self {
            Self::Context(e)
            | Self::Render(e)
            | Self::Commit(e)
            | Self::Redirect(e)
            | Self::Panic(e) => e,
        }
    }
}
