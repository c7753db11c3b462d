//! # Route Metadata
//!
//! A route binds a method and a path pattern to an ordered handler chain.
//!
//! Routes are built once by registration and then only read, except when a
//! later registration on the same method and path merges its handlers into
//! the existing entry.

use crate::ctx::Ctx;
use crate::error::Result;
use crate::group::GroupInfo;
use crate::path::{PathParams, RoutePattern};
use crate::router::Method;
use std::fmt;
use std::sync::Arc;

/// A unit of request processing
///
/// Handlers continue the chain by calling [`Ctx::next`]; returning without
/// doing so ends it.
pub type Handler = Arc<dyn Fn(&mut Ctx) -> Result<()> + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Ctx) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A registered route
#[derive(Clone)]
pub struct Route {
    pub(crate) pos: u32,
    pub(crate) star: bool,
    pub(crate) root: bool,
    pub(crate) mount: bool,

    pub(crate) pattern: RoutePattern,
    pub(crate) group: Option<Arc<GroupInfo>>,

    /// Path pattern as registered (normalized to start with `/`)
    pub path: String,
    /// Method this route answers
    pub method: Method,
    /// Name assigned with [`App::name`](crate::app::App::name)
    pub name: String,
    /// Parameter names in pattern order
    pub params: Vec<String>,
    /// Middleware followed by the primary handler
    pub handlers: Vec<Handler>,
}

impl Route {
    pub(crate) fn new(
        method: Method,
        path: String,
        group: Option<Arc<GroupInfo>>,
        handlers: Vec<Handler>,
        mount: bool,
    ) -> Result<Self> {
        let pattern = RoutePattern::parse(&path)?;

        Ok(Self {
            pos: 0,
            star: path == "/*",
            root: path == "/",
            mount,
            params: pattern.params().to_vec(),
            pattern,
            group,
            path,
            method,
            name: String::new(),
            handlers,
        })
    }

    /// Global registration position, shared across all methods
    ///
    /// Zero until the route is stacked in a table.
    #[must_use]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Whether the pattern is exactly `/*`
    #[must_use]
    pub fn is_wildcard_root(&self) -> bool {
        self.star
    }

    /// Whether the pattern is exactly `/`
    #[must_use]
    pub fn is_exact_root(&self) -> bool {
        self.root
    }

    /// Whether this route was merged in from a mounted sub-application
    #[must_use]
    pub fn is_mount(&self) -> bool {
        self.mount
    }

    /// The group the route was registered through
    #[must_use]
    pub fn group(&self) -> Option<&Arc<GroupInfo>> {
        self.group.as_ref()
    }

    pub(crate) fn matches(&self, path: &str) -> Option<PathParams> {
        if self.star {
            return Some(PathParams::wildcard_only(path));
        }
        if self.root {
            return (path == "/").then(PathParams::default);
        }
        self.pattern.matches(path)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pos", &self.pos)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("handlers", &self.handlers.len())
            .field("mount", &self.mount)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        handler(|_| Ok(()))
    }

    #[test]
    fn test_route_simple() {
        let route = Route::new(Method::Get, "/users".to_string(), None, vec![noop()], false).unwrap();
        assert_eq!(route.path, "/users");
        assert!(route.params.is_empty());
        assert!(!route.is_mount());
        assert_eq!(route.position(), 0);
    }

    #[test]
    fn test_route_root_flags() {
        let root = Route::new(Method::Get, "/".to_string(), None, vec![noop()], false).unwrap();
        assert!(root.is_exact_root());
        assert!(!root.is_wildcard_root());
        assert!(root.matches("/").is_some());
        assert!(root.matches("/x").is_none());

        let star = Route::new(Method::Get, "/*".to_string(), None, vec![noop()], false).unwrap();
        assert!(star.is_wildcard_root());
        assert_eq!(star.matches("/a/b").unwrap().wildcard(), Some("a/b"));
    }

    #[test]
    fn test_route_params() {
        let route = Route::new(
            Method::Get,
            "/users/:user_id/posts/:post_id".to_string(),
            None,
            vec![noop()],
            false,
        )
        .unwrap();
        assert_eq!(route.params, vec!["user_id".to_string(), "post_id".to_string()]);
    }
}
