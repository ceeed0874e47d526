//! Client configuration.
//! Defaults mirror the production backend contract; every knob can be
//! overridden through `MALLKIT_*` environment variables or by building the
//! struct directly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sole business code treated as a fulfilled result.
pub const BUSINESS_SUCCESS: i64 = 200;
/// Business code hard-wired to the forced-logout flow.
pub const BUSINESS_UNAUTHORIZED: i64 = 401;

pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_CREDENTIAL_HEADER: &str = "token";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_DOWNGRADE_PATH: &str = "/404";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every relative request path is joined against.
    pub base_url: String,
    /// Wall-clock timeout applied to each dispatched request.
    pub timeout_ms: u64,
    /// Header name the session token is attached under.
    pub credential_header: String,
    /// Regex patterns (matched against the request path) exempted from
    /// unified response classification. Matching calls hand the raw envelope
    /// straight back to the caller.
    #[serde(default)]
    pub classify_bypass: Vec<String>,
    /// Paths that never require a credential; a 401 on these does not force
    /// a logout.
    #[serde(default)]
    pub no_auth_paths: Vec<String>,
    /// Business codes that downgrade to a full page load of
    /// `downgrade_path`. Empty by default; populated per deployment.
    #[serde(default)]
    pub downgrade_codes: Vec<i64>,
    pub login_path: String,
    pub downgrade_path: String,
    /// Where the versioned session record is persisted. `None` keeps the
    /// session in memory only.
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7878".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            credential_header: DEFAULT_CREDENTIAL_HEADER.to_string(),
            classify_bypass: Vec::new(),
            no_auth_paths: vec!["app/main/getToken".to_string()],
            downgrade_codes: Vec::new(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            downgrade_path: DEFAULT_DOWNGRADE_PATH.to_string(),
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment, falling back to defaults.
    /// Recognized variables: MALLKIT_BASE_URL, MALLKIT_TIMEOUT_MS,
    /// MALLKIT_CREDENTIAL_HEADER, MALLKIT_SESSION_FILE.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("MALLKIT_BASE_URL") {
            if !v.is_empty() {
                cfg.base_url = v;
            }
        }
        if let Some(ms) = std::env::var("MALLKIT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.timeout_ms = ms;
        }
        if let Ok(v) = std::env::var("MALLKIT_CREDENTIAL_HEADER") {
            if !v.is_empty() {
                cfg.credential_header = v;
            }
        }
        if let Ok(v) = std::env::var("MALLKIT_SESSION_FILE") {
            if !v.is_empty() {
                cfg.session_file = Some(PathBuf::from(v));
            }
        }
        cfg
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}
