//! # Route Groups
//!
//! Nested path-prefix scopes. A group never matches requests itself; it only
//! rewrites the paths of the routes registered through it.

use crate::app::App;
use crate::error::Result;
use crate::route::Handler;
use crate::router::{join_paths, Router};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Group state shared with the routes registered through it
pub struct GroupInfo {
    parent: Option<Arc<GroupInfo>>,
    name: RwLock<String>,
    prefix: String,
    any_route: AtomicBool,
}

impl GroupInfo {
    /// The group's name, including its parents' names
    #[must_use]
    pub fn name(&self) -> String {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The prefix this group was opened with
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Absolute prefix: every ancestor's prefix, root-most first, then this one
    #[must_use]
    pub fn full_prefix(&self) -> String {
        let mut chain = vec![self.prefix.as_str()];
        let mut cursor = self.parent.as_deref();
        while let Some(group) = cursor {
            chain.push(&group.prefix);
            cursor = group.parent.as_deref();
        }
        chain
            .into_iter()
            .rev()
            .fold(String::new(), |acc, prefix| join_paths(&acc, prefix))
    }

    /// Whether any route was registered through this group
    #[must_use]
    pub fn has_routes(&self) -> bool {
        self.any_route.load(Ordering::Acquire)
    }

    /// Enclosing group, if nested
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<GroupInfo>> {
        self.parent.as_ref()
    }
}

impl fmt::Debug for GroupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupInfo")
            .field("name", &self.name())
            .field("prefix", &self.prefix)
            .field("any_route", &self.has_routes())
            .finish_non_exhaustive()
    }
}

/// A registration scope that prefixes every path
#[derive(Clone, Debug)]
pub struct Group {
    app: App,
    info: Arc<GroupInfo>,
}

impl Group {
    pub(crate) fn new(app: App, parent: Option<Arc<GroupInfo>>, prefix: &str) -> Self {
        let name = parent.as_ref().map(|p| p.name()).unwrap_or_default();
        Self {
            app,
            info: Arc::new(GroupInfo {
                parent,
                name: RwLock::new(name),
                prefix: prefix.to_string(),
                any_route: AtomicBool::new(false),
            }),
        }
    }

    /// Shared group state
    #[must_use]
    pub fn info(&self) -> &Arc<GroupInfo> {
        &self.info
    }

    /// The owning application
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Absolute prefix of this group
    #[must_use]
    pub fn prefix(&self) -> String {
        self.info.full_prefix()
    }

    /// Name this group; the parent group's name is prepended
    ///
    /// # Errors
    ///
    /// `Error::Hook` if an onGroupName listener fails.
    pub fn name(&self, name: &str) -> Result<&Self> {
        let full = match &self.info.parent {
            Some(parent) => format!("{}{name}", parent.name()),
            None => name.to_string(),
        };
        *self
            .info
            .name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = full;

        self.app.hooks().execute_on_group_name(self)?;
        Ok(self)
    }
}

impl Router for Group {
    fn register(
        &self,
        methods: &[&str],
        path: &str,
        handler: Option<Handler>,
        middleware: Vec<Handler>,
    ) -> Result<()> {
        let path = join_paths(&self.info.full_prefix(), path);
        self.info.any_route.store(true, Ordering::Release);
        self.app.register_route(
            methods,
            &path,
            Some(Arc::clone(&self.info)),
            handler,
            middleware,
        )
    }

    fn group(&self, prefix: &str) -> Result<Group> {
        let group = Self::new(self.app.clone(), Some(Arc::clone(&self.info)), prefix);
        self.app.hooks().execute_on_group(&group)?;
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Method;

    #[test]
    fn test_nested_prefix_composition() {
        let app = App::new();
        let api = app.group("/api").unwrap();
        let v1 = api.group("v1").unwrap();
        assert_eq!(v1.prefix(), "/api/v1");

        v1.get("/users/:id", |_| Ok(())).unwrap();

        let routes = app.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/api/v1/users/:id");
        assert_eq!(routes[0].method, Method::Get);
        assert!(Arc::ptr_eq(routes[0].group().unwrap(), v1.info()));
    }

    #[test]
    fn test_has_routes_flag() {
        let app = App::new();
        let api = app.group("/api").unwrap();
        let admin = api.group("/admin").unwrap();
        assert!(!api.info().has_routes());

        admin.post("/login", |_| Ok(())).unwrap();
        assert!(admin.info().has_routes());
        assert!(!api.info().has_routes());
    }

    #[test]
    fn test_group_root_path() {
        let app = App::new();
        let api = app.group("/api").unwrap();
        api.get("/", |_| Ok(())).unwrap();
        assert_eq!(app.routes()[0].path, "/api");
    }

    #[test]
    fn test_group_names_nest() {
        let app = App::new();
        let api = app.group("/api").unwrap();
        api.name("api.").unwrap();
        let users = api.group("/users").unwrap();
        users.name("users.").unwrap();
        assert_eq!(users.info().name(), "api.users.");

        users.get("/", |_| Ok(())).unwrap();
        app.name("index").unwrap();
        assert_eq!(app.routes()[0].name, "api.users.index");
    }
}
