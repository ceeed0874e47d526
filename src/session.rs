//! Auth session: the process-wide credential cell.
//! One token, mutable only through the defined actions, persisted as a
//! versioned record and re-hydrated on startup. Every mutation persists
//! before it returns and then fires the registered observers, so a
//! dependent read after `set`/`clear` never sees the old value.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RequestError;

/// Bump when the persisted record shape changes; a stored record with a
/// different version is discarded on load, never passed through raw.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    version: u32,
    token: String,
    #[serde(default)]
    saved_at_ms: i64,
}

type Observer = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    file: Option<PathBuf>,
    token: RwLock<String>,
    observers: RwLock<Vec<Observer>>,
}

impl AuthSession {
    /// Session without durable storage. Starts empty.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                file: None,
                token: RwLock::new(String::new()),
                observers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Hydrate from the persisted record at `path`. An absent, corrupt or
    /// version-mismatched record yields the default empty session.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let token = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<PersistedSession>(&bytes) {
                Ok(rec) if rec.version == SESSION_SCHEMA_VERSION => rec.token,
                Ok(rec) => {
                    warn!(target: "session",
                        stored = rec.version, current = SESSION_SCHEMA_VERSION,
                        "discarding session record with mismatched schema version");
                    String::new()
                }
                Err(e) => {
                    warn!(target: "session", "discarding unreadable session record: {}", e);
                    String::new()
                }
            },
            Err(_) => String::new(),
        };
        Self {
            inner: Arc::new(SessionInner {
                file: Some(path),
                token: RwLock::new(token),
                observers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of the current token. Empty string means unauthenticated.
    pub fn get(&self) -> String {
        self.inner.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.inner.token.read().is_empty()
    }

    pub fn set(&self, token: impl Into<String>) {
        self.mutate(token.into());
    }

    pub fn clear(&self) {
        self.mutate(String::new());
    }

    /// Targeted field update. The session record currently carries a single
    /// field, so anything other than `token` is a configuration error.
    pub fn update_field(&self, key: &str, value: &str) -> Result<(), RequestError> {
        match key {
            "token" => {
                self.mutate(value.to_string());
                Ok(())
            }
            other => Err(RequestError::Configuration(format!(
                "unknown session field: {other}"
            ))),
        }
    }

    /// Register an observer fired after every completed mutation with the new
    /// token value. Route regeneration and UI badges hang off this.
    pub fn subscribe(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        self.inner.observers.write().push(Box::new(f));
    }

    fn mutate(&self, new_token: String) {
        {
            let mut tok = self.inner.token.write();
            if *tok == new_token {
                return;
            }
            *tok = new_token.clone();
        }
        self.persist(&new_token);
        debug!(target: "session", authenticated = !new_token.is_empty(), "session mutated");
        let observers = self.inner.observers.read();
        for f in observers.iter() {
            f(&new_token);
        }
    }

    /// Write the versioned record via temp-file + rename so a crash mid-write
    /// never leaves a torn record behind. Storage failures are logged, not
    /// surfaced: the in-memory state is already the source of truth.
    fn persist(&self, token: &str) {
        let Some(path) = &self.inner.file else { return };
        let rec = PersistedSession {
            version: SESSION_SCHEMA_VERSION,
            token: token.to_string(),
            saved_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        let bytes = match serde_json::to_vec_pretty(&rec) {
            Ok(b) => b,
            Err(e) => {
                warn!(target: "session", "failed to encode session record: {}", e);
                return;
            }
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).ok();
        }
        let tmp = path.with_extension("json.tmp");
        let written = std::fs::write(&tmp, bytes).and_then(|_| std::fs::rename(&tmp, path));
        if let Err(e) = written {
            warn!(target: "session", "failed to persist session record: {}", e);
        }
    }
}
