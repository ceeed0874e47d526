//! Adapters the pipeline drives: the navigation surface and the toast layer.
//! Both are thin seams; the real router and toast widgets live outside this
//! crate. Defaults log through `tracing`, the recording variants back the
//! test suites.

use parking_lot::Mutex;
use tracing::info;

/// Navigation surface consumed by the classifier side effects.
pub trait Navigator: Send + Sync {
    /// Client-side route change. `replace` swaps the current history entry
    /// so back-navigation cannot return to the previous view.
    fn navigate(&self, path: &str, replace: bool);
    /// Full page load. Resets all in-memory state on purpose.
    fn hard_redirect(&self, path: &str);
}

/// Transient user notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, msg: &str);
    fn fail(&self, msg: &str);
    fn loading(&self, msg: &str);
    fn clear(&self);
}

/// Default navigator: logs the intent and nothing else.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str, replace: bool) {
        info!(target: "router", path = path, replace = replace, "navigate");
    }

    fn hard_redirect(&self, path: &str) {
        info!(target: "router", path = path, "hard_redirect");
    }
}

/// Default notifier: logs the toast text.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, msg: &str) {
        info!(target: "toast", kind = "success", "{}", msg);
    }

    fn fail(&self, msg: &str) {
        info!(target: "toast", kind = "fail", "{}", msg);
    }

    fn loading(&self, msg: &str) {
        info!(target: "toast", kind = "loading", "{}", msg);
    }

    fn clear(&self) {
        info!(target: "toast", "clear");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    Navigate { path: String, replace: bool },
    HardRedirect { path: String },
}

/// Captures navigation calls. Used by the test suites.
#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavEvent>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str, replace: bool) {
        self.events.lock().push(NavEvent::Navigate { path: path.to_string(), replace });
    }

    fn hard_redirect(&self, path: &str) {
        self.events.lock().push(NavEvent::HardRedirect { path: path.to_string() });
    }
}

/// Captures toast text. Used by the test suites.
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<(String, String)> {
        self.toasts.lock().clone()
    }

    fn push(&self, kind: &str, msg: &str) {
        self.toasts.lock().push((kind.to_string(), msg.to_string()));
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, msg: &str) {
        self.push("success", msg);
    }

    fn fail(&self, msg: &str) {
        self.push("fail", msg);
    }

    fn loading(&self, msg: &str) {
        self.push("loading", msg);
    }

    fn clear(&self) {
        self.push("clear", "");
    }
}
