//! Unified response classification.
//! A pure decision table from a settled transport outcome to exactly one
//! action; the pipeline executes the action afterwards. First match wins.

/// Settled outcome of a dispatch, reduced to what classification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Superseded by a newer identical request.
    Cancelled,
    /// Per-request wall-clock timeout expired.
    TimedOut,
    /// Transport could not complete the exchange.
    Network(String),
    /// A decoded envelope with its business code and message.
    Envelope { code: i64, msg: String },
}

/// What the pipeline must do about an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    /// Transient toast with the given text.
    Notify(String),
    /// Clear the session, toast, navigate to the login route replacing
    /// history.
    ForceLogout,
    /// Full page load of the target; intentionally resets in-memory state.
    HardRedirect(String),
}

/// Classification inputs that come from configuration rather than the call.
#[derive(Debug, Clone)]
pub struct Rules<'a> {
    pub success_code: i64,
    pub unauthorized_code: i64,
    /// Paths that never carry a credential; 401 on these is ordinary
    /// business failure, not session expiry.
    pub no_auth_paths: &'a [String],
    /// Business codes that downgrade to a full page load.
    pub downgrade_codes: &'a [i64],
    pub downgrade_path: &'a str,
}

pub const TIMEOUT_NOTICE: &str = "request timed out";
pub const NETWORK_NOTICE: &str = "network error, please retry";
pub const GENERIC_FAILURE_NOTICE: &str = "request failed";

/// Map one settled outcome to one action. No side effects here; keeping the
/// table pure is what makes it independently testable.
pub fn classify(outcome: &Outcome, path: &str, rules: &Rules<'_>) -> Action {
    match outcome {
        // Already surfaced as a Cancelled rejection upstream; silent.
        Outcome::Cancelled => Action::None,
        Outcome::TimedOut => Action::Notify(TIMEOUT_NOTICE.to_string()),
        Outcome::Network(_) => Action::Notify(NETWORK_NOTICE.to_string()),
        Outcome::Envelope { code, msg } => {
            if *code == rules.unauthorized_code && !rules.no_auth_paths.iter().any(|p| path.contains(p.as_str())) {
                Action::ForceLogout
            } else if rules.downgrade_codes.contains(code) {
                Action::HardRedirect(rules.downgrade_path.to_string())
            } else if *code != rules.success_code {
                let text = if msg.is_empty() { GENERIC_FAILURE_NOTICE.to_string() } else { msg.clone() };
                Action::Notify(text)
            } else {
                Action::None
            }
        }
    }
}
