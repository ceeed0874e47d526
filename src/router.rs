//! Permission-driven navigation surface.
//! Keeps the active compiled table behind an atomic swap: a new permission
//! set replaces the whole table, a navigation event only ever observes one
//! generation. Keep the public surface thin and split implementation across
//! sub-modules.

pub mod compiler;
pub mod record;
pub mod registry;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::config::DEFAULT_LOGIN_PATH;
use crate::session::AuthSession;

pub use compiler::{CompileError, CompiledRoute, GuardContext, Resolution, RouteTable};
pub use record::{default_routes, Route, RouteHandle};
pub use registry::{ComponentId, ComponentRegistry};

/// Owned navigation decision, with guard deflection already mapped to the
/// configured login path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Render { route_id: String, component_key: String, params: Vec<(String, String)> },
    Redirect(String),
    /// Deflected by a guard: go to the login route, replacing history.
    Login(String),
    NotFound(Option<String>),
}

#[derive(Clone)]
pub struct PermissionRouter {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    registry: ComponentRegistry,
    login_path: String,
    active: RwLock<Arc<RouteTable>>,
}

impl PermissionRouter {
    pub fn new(registry: ComponentRegistry, login_path: impl Into<String>) -> Self {
        let initial = Arc::new(RouteTable::compile_or_fallback(&[], &registry));
        Self {
            inner: Arc::new(RouterInner {
                registry,
                login_path: login_path.into(),
                active: RwLock::new(initial),
            }),
        }
    }

    /// Router over the built-in app-shell views and the default login path.
    pub fn with_builtin() -> Self {
        Self::new(registry::builtin().clone(), DEFAULT_LOGIN_PATH)
    }

    /// Compile `records` and swap the active table in one motion. Degrades
    /// to the default shell / fallback table per the compiler's failure
    /// policy; the previous table is discarded wholesale.
    pub fn install(&self, records: &[Route]) -> Arc<RouteTable> {
        let table = Arc::new(RouteTable::compile_or_fallback(records, &self.inner.registry));
        *self.inner.active.write() = table.clone();
        info!(target: "router", entries = table.len(), "route table installed");
        table
    }

    /// Reinstall the default shell (logout, failed permission fetch).
    pub fn reset(&self) {
        self.install(&[]);
    }

    /// Snapshot of the active table.
    pub fn table(&self) -> Arc<RouteTable> {
        self.inner.active.read().clone()
    }

    pub fn login_path(&self) -> &str {
        &self.inner.login_path
    }

    /// Resolve a navigation against the active table and the *current*
    /// session state. The roles come from the caller because the session
    /// cell stores only the credential.
    pub fn navigate(&self, path: &str, session: &AuthSession, roles: &[String]) -> NavOutcome {
        let guard = GuardContext::with_roles(session, roles);
        let table = self.table();
        match table.resolve(path, &guard) {
            Resolution::Render { route, params } => NavOutcome::Render {
                route_id: route.id.clone(),
                component_key: route.component_key.clone(),
                params,
            },
            Resolution::Redirect(target) => NavOutcome::Redirect(target),
            Resolution::Deflected => NavOutcome::Login(self.inner.login_path.clone()),
            Resolution::NotFound(entry) => NavOutcome::NotFound(entry.map(|e| e.id.clone())),
        }
    }

    /// Tie the route table to the session lifecycle: clearing the token
    /// drops back to the default shell immediately. Regeneration after login
    /// goes through the permission fetch (`services::permission`).
    pub fn bind_session(&self, session: &AuthSession) {
        let router = self.clone();
        session.subscribe(move |token| {
            if token.is_empty() {
                router.reset();
            }
        });
    }
}
