//! Runtime mode configuration.

use crate::context::Env;

/// Bindings consulted, in order, to determine the runtime mode.
pub const MODE_BINDINGS: [&str; 2] = ["NODE_ENV", "MODE"];

/// Whether the worker runs in production or development.
///
/// Controls error verbosity and log format. Read once when a dispatcher is
/// constructed, never per request from global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Verbose errors and human-readable logs.
    #[default]
    Development,
    /// Opaque errors and JSON logs.
    Production,
}

impl Mode {
    /// Parse a mode string. Only `production` selects production.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Resolve the mode from host bindings, defaulting to development.
    pub fn from_env(env: &Env) -> Self {
        MODE_BINDINGS
            .iter()
            .find_map(|name| env.get(name))
            .map(Self::parse)
            .unwrap_or_default()
    }

    /// Check for production mode.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Get mode as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
