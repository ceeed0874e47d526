//!
//! mallkit request pipeline
//! ------------------------
//! Every outbound call passes through here. The stages, in order:
//! - attach the session credential when one is present;
//! - register the call in the pending table (cancelling any identical
//!   in-flight call, last writer wins);
//! - dispatch over the transport with the configured timeout, racing the
//!   cancellation handle;
//! - on settle, release the pending entry and the loading slot on every
//!   exit path;
//! - decode the `{code, data, msg}` envelope and run it through the
//!   classifier unless the path is on the bypass allow-list;
//! - execute the classified action (toast, forced logout, hard redirect);
//! - resolve with typed `data` on the success code, reject with the
//!   envelope otherwise.

pub mod classify;
pub mod pending;

use std::sync::Arc;

use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClientConfig, BUSINESS_SUCCESS, BUSINESS_UNAUTHORIZED};
use crate::error::{ApiResult, RequestError};
use crate::loading::LoadingTracker;
use crate::nav::{LogNavigator, LogNotifier, Navigator, Notifier};
use crate::session::AuthSession;

use classify::{classify, Action, Outcome, Rules};
use pending::{Fingerprint, PendingRegistry};

pub const LOGIN_EXPIRED_NOTICE: &str = "login expired, please sign in again";

/// Wire envelope carried by every backend response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub msg: String,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.code == BUSINESS_SUCCESS
    }
}

/// How the call's parameters travel.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    /// Appended to the URL as a query string.
    Query(Value),
    /// JSON request body.
    Json(Value),
    /// `application/x-www-form-urlencoded; charset=utf-8` body.
    Form(Value),
}

impl Payload {
    fn params(&self) -> Option<&Value> {
        match self {
            Payload::None => None,
            Payload::Query(v) | Payload::Json(v) | Payload::Form(v) => Some(v),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    cfg: ClientConfig,
    http: reqwest::Client,
    session: AuthSession,
    pending: PendingRegistry,
    loading: LoadingTracker,
    nav: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    bypass: Vec<Regex>,
}

impl ApiClient {
    pub fn new(
        cfg: ClientConfig,
        session: AuthSession,
        nav: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> ApiResult<Self> {
        let mut bypass = Vec::with_capacity(cfg.classify_bypass.len());
        for pat in &cfg.classify_bypass {
            let re = Regex::new(pat).map_err(|e| {
                RequestError::Configuration(format!("invalid bypass pattern '{pat}': {e}"))
            })?;
            bypass.push(re);
        }
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| RequestError::Configuration(format!("failed to build http client: {e}")))?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                cfg,
                http,
                session,
                pending: PendingRegistry::new(),
                loading: LoadingTracker::new(),
                nav,
                notifier,
                bypass,
            }),
        })
    }

    /// Client with the default adapters; the session hydrates from
    /// `cfg.session_file` when set.
    pub fn with_defaults(cfg: ClientConfig) -> ApiResult<Self> {
        let session = match &cfg.session_file {
            Some(path) => AuthSession::load(path.clone()),
            None => AuthSession::in_memory(),
        };
        Self::new(cfg, session, Arc::new(LogNavigator), Arc::new(LogNotifier))
    }

    pub fn session(&self) -> &AuthSession {
        &self.inner.session
    }

    pub fn loading(&self) -> &LoadingTracker {
        &self.inner.loading
    }

    pub fn pending(&self) -> &PendingRegistry {
        &self.inner.pending
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.cfg
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: Option<Value>) -> ApiResult<T> {
        self.request(Method::GET, path, params.map_or(Payload::None, Payload::Query), None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> ApiResult<T> {
        self.request(Method::POST, path, body.map_or(Payload::None, Payload::Json), None).await
    }

    pub async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Value) -> ApiResult<T> {
        self.request(Method::POST, path, Payload::Form(form), None).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> ApiResult<T> {
        self.request(Method::PUT, path, body.map_or(Payload::None, Payload::Json), None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, params: Option<Value>) -> ApiResult<T> {
        self.request(Method::DELETE, path, params.map_or(Payload::None, Payload::Query), None).await
    }

    /// Full-control entry point: explicit method, payload shape and an
    /// optional caller-supplied fingerprint for calls whose params contain
    /// volatile fields that must not participate in deduplication.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
        fingerprint: Option<Fingerprint>,
    ) -> ApiResult<T> {
        let env = self.request_envelope(method, path, payload, fingerprint).await?;
        serde_json::from_value(env.data)
            .map_err(|e| RequestError::Configuration(format!("response decode failed: {e}")))
    }

    /// Like [`request`](Self::request) but hands back the whole envelope.
    pub async fn request_envelope(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
        fingerprint: Option<Fingerprint>,
    ) -> ApiResult<Envelope> {
        let fp = fingerprint
            .unwrap_or_else(|| Fingerprint::of(method.as_str(), path, payload.params()));
        let (guard, cancel_rx) = self.inner.pending.register(&fp);
        let loading = self.inner.loading.begin(fp.as_str());

        let settled = self.transport(method, path, payload, cancel_rx).await;

        // Release the pending entry and the loading slot before any side
        // effect can re-enter the pipeline.
        drop(guard);
        drop(loading);

        if self.is_bypassed(path) {
            return match settled {
                Ok(env) if env.is_success() => Ok(env),
                Ok(env) => Err(RequestError::Business(env)),
                Err(e) => Err(e),
            };
        }

        let outcome = match &settled {
            Ok(env) => Some(Outcome::Envelope { code: env.code, msg: env.msg.clone() }),
            Err(RequestError::Cancelled) => Some(Outcome::Cancelled),
            Err(RequestError::Timeout) => Some(Outcome::TimedOut),
            Err(RequestError::Network(m)) => Some(Outcome::Network(m.clone())),
            // Local configuration failures never reach the user.
            Err(_) => None,
        };
        let mut forced_logout = false;
        if let Some(outcome) = outcome {
            let action = classify(&outcome, path, &self.rules());
            forced_logout = matches!(action, Action::ForceLogout);
            self.execute(action);
        }

        match settled {
            Ok(env) if env.is_success() => Ok(env),
            Ok(env) if forced_logout => Err(RequestError::AuthExpired(env)),
            Ok(env) => Err(RequestError::Business(env)),
            Err(e) => Err(e),
        }
    }

    async fn transport(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
        cancel_rx: tokio::sync::oneshot::Receiver<()>,
    ) -> Result<Envelope, RequestError> {
        let url = self.join_url(path)?;
        let mut req = self
            .inner
            .http
            .request(method.clone(), url)
            .timeout(self.inner.cfg.timeout());

        let token = self.inner.session.get();
        if !token.is_empty() {
            req = req.header(self.inner.cfg.credential_header.as_str(), token);
        }
        req = match payload {
            Payload::None => req,
            Payload::Query(v) => req.query(&query_pairs(&v)),
            Payload::Json(v) => req.json(&v),
            Payload::Form(v) => req
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded;charset=utf-8")
                .body(form_encode(&v)),
        };

        debug!(target: "http", method = %method, path = path, "dispatch");
        let send = req.send();
        tokio::pin!(send);
        let resp = tokio::select! {
            // Cancellation wins when both are ready: the superseding call has
            // already claimed this fingerprint.
            biased;
            _ = cancel_rx => {
                debug!(target: "http", path = path, "request cancelled");
                return Err(RequestError::Cancelled);
            }
            r = &mut send => r.map_err(RequestError::from)?,
        };

        let status = resp.status();
        let env = resp
            .json::<Envelope>()
            .await
            .map_err(|e| RequestError::Network(format!("invalid response body: {e}")))?;
        debug!(target: "http", status = status.as_u16(), code = env.code, path = path, "settled");
        Ok(env)
    }

    fn execute(&self, action: Action) {
        match action {
            Action::None => {}
            Action::Notify(msg) => self.inner.notifier.fail(&msg),
            Action::ForceLogout => {
                warn!(target: "http", "credential expired; forcing logout");
                self.inner.session.clear();
                self.inner.notifier.fail(LOGIN_EXPIRED_NOTICE);
                self.inner.nav.navigate(&self.inner.cfg.login_path, true);
            }
            Action::HardRedirect(target) => {
                warn!(target: "http", target_path = target.as_str(), "downgrading via hard redirect");
                self.inner.nav.hard_redirect(&target);
            }
        }
    }

    fn rules(&self) -> Rules<'_> {
        Rules {
            success_code: BUSINESS_SUCCESS,
            unauthorized_code: BUSINESS_UNAUTHORIZED,
            no_auth_paths: &self.inner.cfg.no_auth_paths,
            downgrade_codes: &self.inner.cfg.downgrade_codes,
            downgrade_path: &self.inner.cfg.downgrade_path,
        }
    }

    fn is_bypassed(&self, path: &str) -> bool {
        self.inner.bypass.iter().any(|re| re.is_match(path))
    }

    fn join_url(&self, path: &str) -> Result<reqwest::Url, RequestError> {
        let joined = format!(
            "{}/{}",
            self.inner.cfg.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        reqwest::Url::parse(&joined)
            .map_err(|e| RequestError::Configuration(format!("invalid request url '{joined}': {e}")))
    }
}

/// Flatten a JSON object into query pairs; nulls are skipped, scalars are
/// stringified the way the backend expects them.
fn query_pairs(v: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    if let Value::Object(map) = v {
        for (k, val) in map {
            match val {
                Value::Null => {}
                Value::String(s) => out.push((k.clone(), s.clone())),
                other => out.push((k.clone(), other.to_string())),
            }
        }
    }
    out
}

/// Percent-encode a flat JSON object as a form body.
fn form_encode(v: &Value) -> String {
    let mut parts = Vec::new();
    if let Value::Object(map) = v {
        for (k, val) in map {
            let text = match val {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            parts.push(format!(
                "{}={}",
                urlencoding::encode(k),
                urlencoding::encode(&text)
            ));
        }
    }
    parts.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_pairs_stringify_scalars_and_skip_nulls() {
        let pairs = query_pairs(&json!({"page": 2, "category": "tea", "spec": null, "active": true}));
        assert!(pairs.contains(&("page".to_string(), "2".to_string())));
        assert!(pairs.contains(&("category".to_string(), "tea".to_string())));
        assert!(pairs.contains(&("active".to_string(), "true".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "spec"));
    }

    #[test]
    fn form_encode_percent_encodes() {
        let body = form_encode(&json!({"phone": "+86 138", "captcha": "a&b"}));
        assert!(body.contains("phone=%2B86%20138"));
        assert!(body.contains("captcha=a%26b"));
    }

    #[test]
    fn bad_bypass_pattern_is_a_configuration_error() {
        let cfg = ClientConfig {
            classify_bypass: vec!["(".to_string()],
            ..ClientConfig::default()
        };
        match ApiClient::with_defaults(cfg) {
            Err(RequestError::Configuration(msg)) => assert!(msg.contains("bypass pattern")),
            Err(other) => panic!("expected configuration error, got {other:?}"),
            Ok(_) => panic!("client built with an invalid bypass pattern"),
        }
    }

    #[test]
    fn bypass_matches_by_pattern() {
        let cfg = ClientConfig {
            classify_bypass: vec!["^/api/health".to_string(), "captcha".to_string()],
            ..ClientConfig::default()
        };
        let client = ApiClient::with_defaults(cfg).unwrap();
        assert!(client.is_bypassed("/api/health/live"));
        assert!(client.is_bypassed("/api/captcha"));
        assert!(!client.is_bypassed("/api/cart"));
    }

    #[test]
    fn join_url_handles_slashes() {
        let cfg = ClientConfig {
            base_url: "http://localhost:7878/".to_string(),
            ..ClientConfig::default()
        };
        let client = ApiClient::with_defaults(cfg).unwrap();
        let url = client.join_url("/api/cart").unwrap();
        assert_eq!(url.as_str(), "http://localhost:7878/api/cart");
        let url = client.join_url("app/main/getToken").unwrap();
        assert_eq!(url.as_str(), "http://localhost:7878/app/main/getToken");
    }
}
