//! In-flight call tracking: a global flag plus a per-call map keyed by
//! request fingerprint. Set on dispatch, cleared on settle through a drop
//! guard so every exit path releases its slot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone, Default)]
pub struct LoadingTracker {
    inner: Arc<LoadingInner>,
}

#[derive(Default)]
struct LoadingInner {
    global: AtomicBool,
    apis: Mutex<HashMap<String, u32>>,
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a call in flight. The returned guard clears the slot on drop.
    pub fn begin(&self, key: &str) -> LoadingGuard {
        let mut apis = self.inner.apis.lock();
        *apis.entry(key.to_string()).or_insert(0) += 1;
        LoadingGuard { inner: self.inner.clone(), key: key.to_string() }
    }

    /// Whether any call is currently in flight, or the global flag is set.
    pub fn is_loading(&self) -> bool {
        self.inner.global.load(Ordering::Relaxed) || !self.inner.apis.lock().is_empty()
    }

    pub fn api_loading(&self, key: &str) -> bool {
        self.inner.apis.lock().contains_key(key)
    }

    /// Manually driven global flag for flows that are not single requests
    /// (route regeneration, multi-call screens).
    pub fn set_global(&self, loading: bool) {
        self.inner.global.store(loading, Ordering::Relaxed);
    }
}

pub struct LoadingGuard {
    inner: Arc<LoadingInner>,
    key: String,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut apis = self.inner.apis.lock();
        if let Some(count) = apis.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                apis.remove(&self.key);
            }
        }
    }
}
