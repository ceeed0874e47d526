//! Permission-to-route compilation and navigation-time matching.
//! The compiler walks the record forest depth first into an arena: a flat
//! list of compiled entries with children held as indices, no live
//! back-pointers into the input. The input is never mutated and the output
//! is immutable; a new permission set compiles to a whole new table.

use thiserror::Error;
use tracing::{error, warn};

use crate::session::AuthSession;

use super::record::{default_routes, Route};
use super::registry::{ComponentId, ComponentRegistry};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unknown component '{component}' for route '{id}'")]
    UnknownComponent { id: String, component: String },
}

/// One navigable entry. Guard metadata (`protected`, `roles`) is carried
/// forward so it can be re-checked against the session that exists at
/// navigation time, never the one that existed at compile time.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub id: String,
    pub full_path: String,
    pub component: ComponentId,
    pub component_key: String,
    pub redirect: Option<String>,
    pub index: bool,
    pub protected: bool,
    pub roles: Vec<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl CompiledRoute {
    fn is_wildcard(&self) -> bool {
        self.full_path == "*" || self.full_path.ends_with("/*")
    }
}

/// Snapshot of the current session taken when a navigation happens.
#[derive(Debug, Clone, Default)]
pub struct GuardContext {
    pub authenticated: bool,
    pub roles: Vec<String>,
}

impl GuardContext {
    pub fn of_session(session: &AuthSession) -> Self {
        Self { authenticated: session.is_authenticated(), roles: Vec::new() }
    }

    pub fn with_roles(session: &AuthSession, roles: &[String]) -> Self {
        Self { authenticated: session.is_authenticated(), roles: roles.to_vec() }
    }
}

/// Outcome of matching a concrete path against the table.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// Render this entry; `params` carries the values bound to `:segment`
    /// placeholders in order of appearance.
    Render { route: &'a CompiledRoute, params: Vec<(String, String)> },
    /// The matched entry replaces rendering with a redirection.
    Redirect(String),
    /// A guard on the entry or one of its ancestors rejected the current
    /// session; navigation must deflect to the login route.
    Deflected,
    /// No real entry matched; the catch-all entry, when compiled, is handed
    /// back so the gateway can render the error view.
    NotFound(Option<&'a CompiledRoute>),
}

#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<CompiledRoute>,
    roots: Vec<usize>,
}

impl RouteTable {
    /// Depth-first compilation of the record forest. Fails on the first
    /// unknown component key; a failed compile leaves no partial table
    /// behind, the caller degrades to [`RouteTable::fallback`].
    pub fn compile(records: &[Route], reg: &ComponentRegistry) -> Result<RouteTable, CompileError> {
        let mut table = RouteTable::default();
        for rec in records {
            let idx = table.compile_node(rec, None, "", reg)?;
            table.roots.push(idx);
        }
        Ok(table)
    }

    /// Total-replacement entry point with the failure policy applied: empty
    /// input installs the default shell, a compile error degrades to the
    /// minimal error-only table. Never returns an empty table.
    pub fn compile_or_fallback(records: &[Route], reg: &ComponentRegistry) -> RouteTable {
        if records.is_empty() {
            warn!(target: "router", "no permission records; compiling default shell");
            return match Self::compile(&default_routes(), reg) {
                Ok(table) => table,
                Err(e) => {
                    error!(target: "router", "default shell failed to compile: {}", e);
                    Self::fallback(reg)
                }
            };
        }
        match Self::compile(records, reg) {
            Ok(table) if !table.is_empty() => table,
            Ok(_) => Self::fallback(reg),
            Err(e) => {
                error!(target: "router", "route compilation failed: {}", e);
                Self::fallback(reg)
            }
        }
    }

    /// Minimal degraded table: a single catch-all error entry.
    pub fn fallback(reg: &ComponentRegistry) -> RouteTable {
        RouteTable {
            entries: vec![CompiledRoute {
                id: "error".to_string(),
                full_path: "*".to_string(),
                component: reg.error_component(),
                component_key: super::registry::ERROR_COMPONENT.to_string(),
                redirect: None,
                index: false,
                protected: false,
                roles: Vec::new(),
                title: None,
                icon: None,
                parent: None,
                children: Vec::new(),
            }],
            roots: vec![0],
        }
    }

    fn compile_node(
        &mut self,
        rec: &Route,
        parent: Option<usize>,
        parent_path: &str,
        reg: &ComponentRegistry,
    ) -> Result<usize, CompileError> {
        let component = reg.resolve(&rec.component).ok_or_else(|| CompileError::UnknownComponent {
            id: rec.id.clone(),
            component: rec.component.clone(),
        })?;

        let full_path = if rec.index || rec.path.is_none() {
            // Index entries match the parent path exactly.
            if parent_path.is_empty() { "/".to_string() } else { parent_path.to_string() }
        } else {
            join_paths(parent_path, rec.path.as_deref().unwrap_or_default())
        };

        let idx = self.entries.len();
        self.entries.push(CompiledRoute {
            id: rec.id.clone(),
            full_path: full_path.clone(),
            component,
            component_key: rec.component.clone(),
            redirect: rec.redirect.clone(),
            index: rec.index,
            protected: rec.protected,
            roles: rec.handle.roles.clone().unwrap_or_default(),
            title: rec.handle.title.clone(),
            icon: rec.handle.icon.clone(),
            parent,
            children: Vec::new(),
        });

        for child in &rec.children {
            let child_idx = self.compile_node(child, Some(idx), &full_path, reg)?;
            self.entries[idx].children.push(child_idx);
        }
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.entries.iter()
    }

    pub fn find(&self, id: &str) -> Option<&CompiledRoute> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Match a concrete path and evaluate guards against the given session
    /// snapshot. Guards apply along the whole ancestor chain, so a protected
    /// layout protects every nested entry.
    pub fn resolve<'a>(&'a self, path: &str, guard: &GuardContext) -> Resolution<'a> {
        let clean = path.split('?').next().unwrap_or_default();
        let segs: Vec<&str> = clean.split('/').filter(|s| !s.is_empty()).collect();

        let mut best: Option<(usize, u32, usize)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if let Some(score) = match_path(&entry.full_path, &segs) {
                let depth = self.depth(idx);
                let better = match best {
                    None => true,
                    Some((_, best_score, best_depth)) => {
                        score > best_score || (score == best_score && depth > best_depth)
                    }
                };
                if better {
                    best = Some((idx, score, depth));
                }
            }
        }

        let Some((idx, _, _)) = best else {
            return Resolution::NotFound(None);
        };
        let entry = &self.entries[idx];
        if !self.guard_chain_ok(idx, guard) {
            return Resolution::Deflected;
        }
        if let Some(target) = &entry.redirect {
            return Resolution::Redirect(target.clone());
        }
        if entry.is_wildcard() {
            return Resolution::NotFound(Some(entry));
        }
        Resolution::Render { route: entry, params: bind_params(&entry.full_path, &segs) }
    }

    fn depth(&self, mut idx: usize) -> usize {
        let mut d = 0;
        while let Some(p) = self.entries[idx].parent {
            d += 1;
            idx = p;
        }
        d
    }

    fn guard_chain_ok(&self, idx: usize, guard: &GuardContext) -> bool {
        let mut cur = Some(idx);
        while let Some(i) = cur {
            let entry = &self.entries[i];
            if entry.protected && !guard.authenticated {
                return false;
            }
            if !entry.roles.is_empty() {
                let held = guard.authenticated
                    && entry.roles.iter().any(|r| guard.roles.iter().any(|h| h == r));
                if !held {
                    return false;
                }
            }
            cur = entry.parent;
        }
        true
    }
}

fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') || parent.is_empty() {
        return child.to_string();
    }
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

/// Segment-wise match. Exact matches score in the 100+ band (plus one per
/// literal segment, so literal routes beat parameterized ones); a trailing
/// `*` matches any remainder and scores below every exact match.
fn match_path(pattern: &str, segs: &[&str]) -> Option<u32> {
    let psegs: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    if let Some((last, prefix)) = psegs.split_last() {
        if *last == "*" {
            if segs.len() < prefix.len() {
                return None;
            }
            let mut score = 0;
            for (p, s) in prefix.iter().zip(segs) {
                if p.starts_with(':') {
                    continue;
                }
                if p != s {
                    return None;
                }
                score += 1;
            }
            return Some(score);
        }
    }
    if psegs.len() != segs.len() {
        return None;
    }
    let mut score = 100;
    for (p, s) in psegs.iter().zip(segs) {
        if p.starts_with(':') {
            continue;
        }
        if p != s {
            return None;
        }
        score += 1;
    }
    Some(score)
}

fn bind_params(pattern: &str, segs: &[&str]) -> Vec<(String, String)> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .zip(segs)
        .filter_map(|(p, s)| {
            p.strip_prefix(':').map(|name| (name.to_string(), (*s).to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest() -> GuardContext {
        GuardContext { authenticated: false, roles: Vec::new() }
    }

    fn user(roles: &[&str]) -> GuardContext {
        GuardContext {
            authenticated: true,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn shell_table() -> RouteTable {
        RouteTable::compile(&default_routes(), &ComponentRegistry::with_builtin_views()).unwrap()
    }

    #[test]
    fn index_child_wins_over_its_layout() {
        let table = shell_table();
        match table.resolve("/", &guest()) {
            Resolution::Render { route, .. } => assert_eq!(route.id, "home"),
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn nested_child_paths_join_under_the_layout() {
        let table = shell_table();
        match table.resolve("/cart", &guest()) {
            Resolution::Render { route, .. } => assert_eq!(route.component_key, "Cart"),
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn param_segments_bind_values() {
        let table = shell_table();
        match table.resolve("/product/42", &guest()) {
            Resolution::Render { route, params } => {
                assert_eq!(route.id, "product");
                assert_eq!(params, vec![("id".to_string(), "42".to_string())]);
            }
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_path_falls_to_the_wildcard() {
        let table = shell_table();
        match table.resolve("/no/such/page", &guest()) {
            Resolution::NotFound(Some(entry)) => assert_eq!(entry.id, "error"),
            other => panic!("expected wildcard notfound, got {other:?}"),
        }
    }

    #[test]
    fn protected_route_deflects_without_a_token() {
        let mut reg = ComponentRegistry::with_builtin_views();
        reg.register("Admin");
        let records = vec![
            Route::new("home", "Home").path("/"),
            Route::new("admin", "Admin").path("/admin").protected().roles(&["admin"]),
        ];
        let table = RouteTable::compile(&records, &reg).unwrap();
        assert!(matches!(table.resolve("/admin", &guest()), Resolution::Deflected));
        assert!(matches!(table.resolve("/admin", &user(&["viewer"])), Resolution::Deflected));
        match table.resolve("/admin", &user(&["admin"])) {
            Resolution::Render { route, .. } => assert_eq!(route.id, "admin"),
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn protected_layout_guards_its_children() {
        let mut reg = ComponentRegistry::with_builtin_views();
        reg.register("Orders");
        let records = vec![Route::new("account", "BasicsLayout")
            .path("/account")
            .protected()
            .children(vec![Route::new("orders", "Orders").path("orders")])];
        let table = RouteTable::compile(&records, &reg).unwrap();
        assert!(matches!(table.resolve("/account/orders", &guest()), Resolution::Deflected));
        assert!(matches!(
            table.resolve("/account/orders", &user(&[])),
            Resolution::Render { .. }
        ));
    }

    #[test]
    fn redirect_entries_are_terminal() {
        let reg = ComponentRegistry::with_builtin_views();
        let records = vec![
            Route::new("old-home", "Home").path("/index").redirect("/"),
            Route::new("home", "Home").path("/"),
        ];
        let table = RouteTable::compile(&records, &reg).unwrap();
        match table.resolve("/index", &guest()) {
            Resolution::Redirect(target) => assert_eq!(target, "/"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn unknown_component_fails_the_compile() {
        let reg = ComponentRegistry::with_builtin_views();
        let records = vec![Route::new("x", "NoSuchView").path("/x")];
        let err = RouteTable::compile(&records, &reg).unwrap_err();
        assert!(matches!(err, CompileError::UnknownComponent { .. }));
    }

    #[test]
    fn compile_or_fallback_never_yields_an_empty_table() {
        let reg = ComponentRegistry::with_builtin_views();
        let empty = RouteTable::compile_or_fallback(&[], &reg);
        assert!(!empty.is_empty());
        let broken = vec![Route::new("x", "NoSuchView").path("/x")];
        let degraded = RouteTable::compile_or_fallback(&broken, &reg);
        assert!(!degraded.is_empty());
        assert!(degraded.find("error").is_some());
    }

    #[test]
    fn recompilation_leaves_no_residue() {
        let reg = ComponentRegistry::with_builtin_views();
        let first = vec![
            Route::new("home", "Home").path("/"),
            Route::new("cart", "Cart").path("/cart"),
        ];
        let second = vec![Route::new("login", "Login").path("/login")];
        let t1 = RouteTable::compile(&first, &reg).unwrap();
        let t2 = RouteTable::compile(&second, &reg).unwrap();
        assert!(t1.find("cart").is_some());
        assert!(t2.find("cart").is_none());
        assert!(t2.find("home").is_none());
        assert_eq!(t2.len(), 1);
    }
}
