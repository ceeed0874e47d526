//! View-factory registry. Compilation resolves every `component` key through
//! here; an unknown key is a configuration error, not a runtime one.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

/// The fallback error view is always registered first, so a degraded table
/// can be produced from any registry.
pub const ERROR_COMPONENT: &str = "Error";

#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    map: HashMap<String, ComponentId>,
    next: u32,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static BUILTIN: Lazy<ComponentRegistry> = Lazy::new(ComponentRegistry::with_builtin_views);

/// Shared instance of the app-shell registry.
pub fn builtin() -> &'static ComponentRegistry {
    &BUILTIN
}

impl ComponentRegistry {
    pub fn new() -> Self {
        let mut reg = Self { map: HashMap::new(), next: 0 };
        reg.register(ERROR_COMPONENT);
        reg
    }

    /// Registry pre-loaded with the app-shell views.
    pub fn with_builtin_views() -> Self {
        let mut reg = Self::new();
        for key in [
            "BasicsLayout",
            "Home",
            "Category",
            "Cart",
            "Profile",
            "Product",
            "Login",
        ] {
            reg.register(key);
        }
        reg
    }

    /// Register a view key, returning its id. Re-registering an existing key
    /// returns the original id.
    pub fn register(&mut self, key: impl Into<String>) -> ComponentId {
        let key = key.into();
        if let Some(id) = self.map.get(&key) {
            return *id;
        }
        let id = ComponentId(self.next);
        self.next += 1;
        self.map.insert(key, id);
        id
    }

    pub fn resolve(&self, key: &str) -> Option<ComponentId> {
        self.map.get(key).copied()
    }

    pub fn error_component(&self) -> ComponentId {
        // Registered unconditionally in new().
        self.map[ERROR_COMPONENT]
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let mut reg = ComponentRegistry::new();
        let a = reg.register("Home");
        let b = reg.register("Home");
        assert_eq!(a, b);
        assert_eq!(reg.len(), 2); // Error + Home
    }

    #[test]
    fn error_view_is_always_present() {
        let reg = ComponentRegistry::new();
        assert_eq!(reg.resolve(ERROR_COMPONENT), Some(reg.error_component()));
    }

    #[test]
    fn builtin_views_cover_the_shell() {
        let reg = ComponentRegistry::with_builtin_views();
        for key in ["BasicsLayout", "Home", "Cart", "Login", "Error"] {
            assert!(reg.resolve(key).is_some(), "missing {key}");
        }
        assert_eq!(reg.resolve("Admin"), None);
    }
}
