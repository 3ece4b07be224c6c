//! Environment-derived application configuration.

use std::time::Duration;

use anyhow::Context;
use integrador_auth::session::DEFAULT_INIT_TIMEOUT;

/// Base URL of the backend the remote store talks to.
pub const BACKEND_URL_VAR: &str = "INTEGRADOR_BACKEND_URL";
/// Publishable (anon) API key sent with unauthenticated requests.
pub const ANON_KEY_VAR: &str = "INTEGRADOR_BACKEND_ANON_KEY";
/// Optional override for the session bootstrap timeout, in whole seconds.
pub const SESSION_TIMEOUT_VAR: &str = "INTEGRADOR_SESSION_TIMEOUT_SECS";

/// Static configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub anon_key: String,
    /// Upper bound on waiting for the identity provider's first event.
    pub session_timeout: Duration,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Lets tests supply values without mutating process-global env vars.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let backend_url = lookup(BACKEND_URL_VAR)
            .with_context(|| format!("{BACKEND_URL_VAR} is not set"))?;
        let anon_key =
            lookup(ANON_KEY_VAR).with_context(|| format!("{ANON_KEY_VAR} is not set"))?;

        let session_timeout = match lookup(SESSION_TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("{SESSION_TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"))?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_INIT_TIMEOUT,
        };

        Ok(Self { backend_url, anon_key, session_timeout })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
