//! Duplicate-request bookkeeping.
//! A resource-ownership table from fingerprint to cancellation handle:
//! entries are removed on settle, never left to expire. Registering a
//! fingerprint that is already in flight cancels the older caller first
//! (last-writer-wins), synchronously with the new dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// Stable identity of a logical call: method, path and canonicalized params.
/// Two identical calls collide regardless of params key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(method: &str, path: &str, params: Option<&Value>) -> Self {
        match params {
            Some(v) if !v.is_null() => {
                Fingerprint(format!("{}:{}?{}", method, path, canonical_json(v)))
            }
            _ => Fingerprint(format!("{}:{}", method, path)),
        }
    }

    /// Caller-supplied key for requests whose params contain volatile fields
    /// (nonces, timestamps) that must not participate in deduplication.
    pub fn raw(key: impl Into<String>) -> Self {
        Fingerprint(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize with object keys sorted recursively so logically-equal params
/// always produce the same text.
fn canonical_json(v: &Value) -> String {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", serde_json::to_string(k).unwrap_or_default(), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

struct PendingEntry {
    id: Uuid,
    cancel: oneshot::Sender<()>,
    created_at: Instant,
}

/// Table of in-flight requests. Clone shares the underlying map.
#[derive(Clone, Default)]
pub struct PendingRegistry {
    inner: Arc<Mutex<HashMap<String, PendingEntry>>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dispatch under `fp`. Any existing entry for the same
    /// fingerprint is cancelled and evicted before the new one is inserted.
    /// Returns the scope guard that releases the entry on every exit path,
    /// and the receiver the dispatch must race the transport against.
    pub fn register(&self, fp: &Fingerprint) -> (PendingGuard, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        let mut map = self.inner.lock();
        if let Some(prev) = map.remove(fp.as_str()) {
            debug!(target: "http",
                fingerprint = fp.as_str(),
                age_ms = prev.created_at.elapsed().as_millis() as u64,
                "cancelling superseded request");
            let _ = prev.cancel.send(());
        }
        map.insert(
            fp.as_str().to_string(),
            PendingEntry { id, cancel: tx, created_at: Instant::now() },
        );
        (PendingGuard { inner: self.inner.clone(), key: fp.as_str().to_string(), id }, rx)
    }

    /// Explicit removal. A no-op when the fingerprint is absent, so calling
    /// it after the guard already ran is harmless.
    pub fn remove(&self, fp: &Fingerprint) -> bool {
        self.inner.lock().remove(fp.as_str()).is_some()
    }

    /// Cancel every in-flight request (screen teardown, logout).
    pub fn cancel_all(&self) -> usize {
        let mut map = self.inner.lock();
        let n = map.len();
        for (_, entry) in map.drain() {
            let _ = entry.cancel.send(());
        }
        n
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Removes its entry on drop. Identity-checked: if a newer dispatch already
/// replaced the entry for this fingerprint, the guard leaves it alone.
pub struct PendingGuard {
    inner: Arc<Mutex<HashMap<String, PendingEntry>>>,
    key: String,
    id: Uuid,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut map = self.inner.lock();
        if map.get(&self.key).map(|e| e.id) == Some(self.id) {
            map.remove(&self.key);
        }
    }
}
