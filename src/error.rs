//! Unified request error model.
//! Every call through the pipeline settles into exactly one of these kinds;
//! the classifier decides the user-visible side effects, this enum is what the
//! caller receives.

use thiserror::Error;

use crate::http::Envelope;

#[derive(Debug, Error)]
pub enum RequestError {
    /// Superseded by a newer identical in-flight call. Expected, silent.
    #[error("request cancelled: superseded by a newer identical call")]
    Cancelled,

    /// The wall-clock timeout for this dispatch expired.
    #[error("request timed out")]
    Timeout,

    /// The transport could not complete the exchange.
    #[error("network failure: {0}")]
    Network(String),

    /// The backend signalled an expired or missing credential (code 401).
    /// The forced-logout side effects have already run when this surfaces.
    #[error("authentication expired: {}", .0.msg)]
    AuthExpired(Envelope),

    /// Business-level failure: the envelope carried a non-success code.
    #[error("business error {}: {}", .0.code, .0.msg)]
    Business(Envelope),

    /// Client-side misconfiguration (bad allow-list pattern, unknown session
    /// field, undecodable payload shape). Not recoverable at the call site.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RequestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout)
    }

    /// The rejected envelope, when the failure carried one.
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            RequestError::AuthExpired(env) | RequestError::Business(env) => Some(env),
            _ => None,
        }
    }

    /// Business code of the rejected envelope, when present.
    pub fn code(&self) -> Option<i64> {
        self.envelope().map(|e| e.code)
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else {
            RequestError::Network(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, RequestError>;
