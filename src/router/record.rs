//! Permission route records as the backend declares them, plus the built-in
//! app-shell set used before any permission fetch has succeeded.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteHandle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// One node of the permission forest. `component` must name a registered
/// view; a node with `redirect` is terminal for rendering purposes; an
/// `index` node has no path segment of its own and matches the parent path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    #[serde(default)]
    pub index: bool,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Route>,
    #[serde(default)]
    pub handle: RouteHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub protected: bool,
}

impl Route {
    pub fn new(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            index: false,
            id: id.into(),
            path: None,
            component: component.into(),
            redirect: None,
            children: Vec::new(),
            handle: RouteHandle::default(),
            parent: None,
            protected: false,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.handle.roles = Some(roles.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.handle.title = Some(title.into());
        self
    }

    pub fn children(mut self, children: Vec<Route>) -> Self {
        self.children = children;
        self
    }
}

/// The static app shell: tab bar layout with home/category/cart/profile,
/// product detail, login and the catch-all error view. Installed whenever no
/// permission records are available.
pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new("root", "BasicsLayout").path("/").children(vec![
            Route::new("home", "Home").index().title("Home"),
            Route::new("category", "Category").path("category").title("Category"),
            Route::new("cart", "Cart").path("cart").title("Cart"),
            Route::new("profile", "Profile").path("profile").title("Profile"),
        ]),
        Route::new("product", "Product").path("/product/:id"),
        Route::new("login", "Login").path("/login"),
        Route::new("error", "Error").path("*"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_deserialize_from_backend_shape() {
        let text = r#"[
            {"id": "home", "path": "/", "component": "Home"},
            {"id": "admin", "path": "/admin", "component": "Admin",
             "protected": true, "handle": {"roles": ["admin"]}}
        ]"#;
        let records: Vec<Route> = serde_json::from_str(text).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].protected);
        assert_eq!(records[1].handle.roles.as_deref(), Some(&["admin".to_string()][..]));
    }

    #[test]
    fn default_shell_has_the_error_entry() {
        let routes = default_routes();
        assert!(routes.iter().any(|r| r.path.as_deref() == Some("*")));
        assert!(routes.iter().any(|r| r.children.iter().any(|c| c.index)));
    }
}
