//! # Route Table
//!
//! Method-indexed, registration-ordered route storage.
//!
//! ## Features
//!
//! - Five buckets, one per supported method
//! - Consecutive registrations of the same literal path merge their handlers
//! - A single position counter orders routes across all buckets
//! - First-match lookup in registration order
//!
//! Lookup scans in declaration order: the route registered first wins, even
//! when a later one is more specific.

use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::group::Group;
use crate::path::PathParams;
use crate::route::{handler, Handler, Route};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// HTTP methods supported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
}

impl Method {
    /// Every supported method, in bucket order
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Delete, Self::Patch];

    /// Bucket index of this method
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Get => 0,
            Self::Post => 1,
            Self::Put => 2,
            Self::Delete => 3,
            Self::Patch => 4,
        }
    }

    /// Upper-case method name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidMethod {
                method: s.to_string(),
            })
    }
}

impl TryFrom<&hyper::Method> for Method {
    type Error = Error;

    fn try_from(method: &hyper::Method) -> Result<Self> {
        match *method {
            hyper::Method::GET => Ok(Self::Get),
            hyper::Method::POST => Ok(Self::Post),
            hyper::Method::PUT => Ok(Self::Put),
            hyper::Method::DELETE => Ok(Self::Delete),
            hyper::Method::PATCH => Ok(Self::Patch),
            _ => Err(Error::MethodNotAllowed {
                method: method.to_string(),
            }),
        }
    }
}

/// Empty becomes `/`, and a leading `/` is always present
pub(crate) fn normalize_path(raw: &str) -> String {
    if raw.is_empty() {
        "/".to_string()
    } else if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    }
}

/// Join a prefix and a path with exactly one `/` between them
///
/// A path of `/` (or empty) resolves to the prefix itself.
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => normalize_path(prefix),
        (false, false) => format!("{}/{path}", normalize_path(prefix)),
    }
}

/// Per-method route storage
#[derive(Default)]
pub(crate) struct RouteTable {
    stack: [Vec<Arc<Route>>; 5],
    routes_count: u32,
    handlers_count: usize,
    latest: Option<(Method, usize)>,
}

impl RouteTable {
    /// Stack a route, or merge it into an identical predecessor
    ///
    /// Returns the stacked entry. `mounted` routes do not become the latest
    /// route, and their handlers were already counted by the sub-application.
    pub(crate) fn add_route(&mut self, mut route: Route, mounted: bool) -> Arc<Route> {
        let method = route.method;
        if !mounted {
            self.handlers_count += route.handlers.len();
        }
        let bucket = &mut self.stack[method.index()];

        let stacked = match bucket.last_mut() {
            Some(last) if last.path == route.path && !last.mount && !route.mount => {
                Arc::make_mut(last).handlers.extend(route.handlers);
                debug!(
                    method = %method,
                    path = %last.path,
                    handlers = last.handlers.len(),
                    "Merged route handlers"
                );
                Arc::clone(last)
            }
            _ => {
                self.routes_count += 1;
                route.pos = self.routes_count;
                let entry = Arc::new(route);
                bucket.push(Arc::clone(&entry));
                debug!(
                    method = %method,
                    path = %entry.path,
                    pos = entry.pos,
                    mount = entry.mount,
                    "Route registered"
                );
                entry
            }
        };

        if !mounted {
            self.latest = Some((method, bucket.len() - 1));
        }
        stacked
    }

    /// First route of `method` whose pattern matches `path`
    pub(crate) fn find(&self, method: Method, path: &str) -> Option<(Arc<Route>, PathParams)> {
        self.stack[method.index()]
            .iter()
            .find_map(|route| route.matches(path).map(|params| (Arc::clone(route), params)))
    }

    /// Rename the most recently registered route
    pub(crate) fn name_latest(&mut self, name: &str) -> Result<Arc<Route>> {
        let (method, index) = self.latest.ok_or_else(|| Error::NoRoute {
            name: name.to_string(),
        })?;
        let slot = &mut self.stack[method.index()][index];

        let route = Arc::make_mut(slot);
        route.name = match &route.group {
            Some(group) => format!("{}{name}", group.name()),
            None => name.to_string(),
        };
        Ok(Arc::clone(slot))
    }

    /// Routes of one method in registration order
    pub(crate) fn bucket(&self, method: Method) -> &[Arc<Route>] {
        &self.stack[method.index()]
    }

    /// Every stacked route ordered by position
    pub(crate) fn routes(&self) -> Vec<Arc<Route>> {
        let mut all: Vec<Arc<Route>> = self.stack.iter().flatten().cloned().collect();
        all.sort_by_key(|route| route.pos);
        all
    }

    pub(crate) fn handlers_count(&self) -> usize {
        self.handlers_count
    }
}

/// Registration surface shared by [`App`](crate::app::App) and [`Group`]
pub trait Router {
    /// Register `middleware` followed by `handler` for every method
    ///
    /// # Errors
    ///
    /// Configuration errors for an unknown method, an empty handler chain or
    /// a malformed pattern; `Error::Hook` if an onRoute listener fails.
    fn register(
        &self,
        methods: &[&str],
        path: &str,
        handler: Option<Handler>,
        middleware: Vec<Handler>,
    ) -> Result<()>;

    /// Open a nested prefix scope
    ///
    /// # Errors
    ///
    /// `Error::Hook` if an onGroup listener fails.
    fn group(&self, prefix: &str) -> Result<Group>;

    /// Register a full handler chain for several methods
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    fn add(&self, methods: &[&str], path: &str, handlers: Vec<Handler>) -> Result<()> {
        self.register(methods, path, None, handlers)
    }

    /// Register a GET handler
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    fn get<F>(&self, path: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Ctx) -> Result<()> + Send + Sync + 'static,
    {
        self.register(&[Method::Get.as_str()], path, Some(handler(f)), Vec::new())
    }

    /// Register a POST handler
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    fn post<F>(&self, path: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Ctx) -> Result<()> + Send + Sync + 'static,
    {
        self.register(&[Method::Post.as_str()], path, Some(handler(f)), Vec::new())
    }

    /// Register a PUT handler
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    fn put<F>(&self, path: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Ctx) -> Result<()> + Send + Sync + 'static,
    {
        self.register(&[Method::Put.as_str()], path, Some(handler(f)), Vec::new())
    }

    /// Register a PATCH handler
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    fn patch<F>(&self, path: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Ctx) -> Result<()> + Send + Sync + 'static,
    {
        self.register(&[Method::Patch.as_str()], path, Some(handler(f)), Vec::new())
    }

    /// Register a DELETE handler
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    fn delete<F>(&self, path: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Ctx) -> Result<()> + Send + Sync + 'static,
    {
        self.register(&[Method::Delete.as_str()], path, Some(handler(f)), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: Method, path: &str, handlers: usize) -> Route {
        let chain = (0..handlers).map(|_| handler(|_| Ok(()))).collect();
        Route::new(method, path.to_string(), None, chain, false).unwrap()
    }

    #[test]
    fn test_method_from_str() {
        for name in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
            assert_eq!(name.parse::<Method>().unwrap().as_str(), name);
        }
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert!(matches!("HEAD".parse::<Method>(), Err(Error::InvalidMethod { .. })));
    }

    #[test]
    fn test_method_from_hyper() {
        assert_eq!(Method::try_from(&hyper::Method::PATCH).unwrap(), Method::Patch);
        assert!(matches!(
            Method::try_from(&hyper::Method::OPTIONS),
            Err(Error::MethodNotAllowed { .. })
        ));
    }

    #[test]
    fn test_normalize_and_join() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(join_paths("/api", "/users"), "/api/users");
        assert_eq!(join_paths("/api/", "users"), "/api/users");
        assert_eq!(join_paths("/api", "/"), "/api");
        assert_eq!(join_paths("", "/"), "/");
        assert_eq!(join_paths("/", "/users/"), "/users/");
    }

    #[test]
    fn test_merge_consecutive_same_path() {
        let mut table = RouteTable::default();
        table.add_route(route(Method::Get, "/users", 1), false);
        let merged = table.add_route(route(Method::Get, "/users", 2), false);

        assert_eq!(table.bucket(Method::Get).len(), 1);
        assert_eq!(merged.handlers.len(), 3);
        assert_eq!(merged.position(), 1);
        assert_eq!(table.handlers_count(), 3);
    }

    #[test]
    fn test_no_merge_when_not_last() {
        let mut table = RouteTable::default();
        table.add_route(route(Method::Get, "/a", 1), false);
        table.add_route(route(Method::Get, "/b", 1), false);
        table.add_route(route(Method::Get, "/a", 1), false);
        assert_eq!(table.bucket(Method::Get).len(), 3);
    }

    #[test]
    fn test_mount_routes_never_merge() {
        let mut table = RouteTable::default();
        table.add_route(route(Method::Get, "/users", 1), false);
        let mut mounted = route(Method::Get, "/users", 1);
        mounted.mount = true;
        table.add_route(mounted, true);
        assert_eq!(table.bucket(Method::Get).len(), 2);
    }

    #[test]
    fn test_mounted_handlers_not_counted() {
        let mut table = RouteTable::default();
        table.add_route(route(Method::Get, "/a", 2), false);
        let mut mounted = route(Method::Get, "/api/b", 3);
        mounted.mount = true;
        table.add_route(mounted, true);
        assert_eq!(table.handlers_count(), 2);
    }

    #[test]
    fn test_positions_increase_across_methods() {
        let mut table = RouteTable::default();
        let a = table.add_route(route(Method::Get, "/a", 1), false);
        let b = table.add_route(route(Method::Post, "/a", 1), false);
        let c = table.add_route(route(Method::Delete, "/c", 1), false);
        let merged = table.add_route(route(Method::Delete, "/c", 1), false);
        let d = table.add_route(route(Method::Get, "/d", 1), false);

        assert!(a.position() < b.position());
        assert!(b.position() < c.position());
        assert_eq!(merged.position(), c.position());
        assert!(c.position() < d.position());

        let ordered: Vec<u32> = table.routes().iter().map(|r| r.position()).collect();
        assert_eq!(ordered, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = RouteTable::default();
        table.add_route(route(Method::Get, "/users/:id", 1), false);
        table.add_route(route(Method::Get, "/users/me", 1), false);

        let (found, params) = table.find(Method::Get, "/users/me").unwrap();
        assert_eq!(found.path, "/users/:id");
        assert_eq!(params.get("id"), Some("me"));
        assert!(table.find(Method::Post, "/users/me").is_none());
    }

    #[test]
    fn test_name_latest() {
        let mut table = RouteTable::default();
        assert!(matches!(table.name_latest("x"), Err(Error::NoRoute { .. })));

        table.add_route(route(Method::Get, "/a", 1), false);
        table.add_route(route(Method::Post, "/b", 1), false);
        let named = table.name_latest("create").unwrap();
        assert_eq!(named.path, "/b");
        assert_eq!(table.bucket(Method::Post)[0].name, "create");
    }
}
