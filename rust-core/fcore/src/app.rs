//! # Application
//!
//! The framework instance: route table, mount registry, hooks and context
//! pool behind one cheaply cloneable handle.
//!
//! Registration takes the table's write lock. Dispatch clones the matched
//! route under the read lock and releases it before any handler runs, so a
//! handler may register routes or mount applications without deadlocking.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::group::{Group, GroupInfo};
use crate::hooks::{Hooks, ListenData};
use crate::mount::MountRegistry;
use crate::pool::{CtxPool, PooledCtx};
use crate::request::Request;
use crate::response::Response;
use crate::route::{Handler, Route};
use crate::router::{normalize_path, Method, RouteTable, Router};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Mutable routing state guarded by a single lock
#[derive(Default)]
pub(crate) struct RouterState {
    pub(crate) table: RouteTable,
    pub(crate) mounts: MountRegistry,
}

pub(crate) struct AppInner {
    pub(crate) config: Config,
    pub(crate) state: RwLock<RouterState>,
    pub(crate) hooks: Hooks,
    pub(crate) pool: CtxPool,
}

/// A framework instance
///
/// Clones share the same routes, hooks and pool.
#[derive(Clone)]
pub struct App {
    pub(crate) inner: Arc<AppInner>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an application with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an application with the given settings
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let capacity = config.pool_capacity;
        let inner = Arc::new_cyclic(|weak| AppInner {
            config,
            state: RwLock::new(RouterState::default()),
            hooks: Hooks::default(),
            pool: CtxPool::new(weak.clone(), capacity),
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<AppInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, RouterState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, RouterState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether two handles refer to the same application
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Application settings
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Lifecycle listener registry
    #[must_use]
    pub fn hooks(&self) -> &Hooks {
        &self.inner.hooks
    }

    /// Context pool
    #[must_use]
    pub fn pool(&self) -> &CtxPool {
        &self.inner.pool
    }

    /// Every registered route, ordered by position
    #[must_use]
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.read_state().table.routes()
    }

    /// Routes of one method in lookup order
    #[must_use]
    pub fn routes_for(&self, method: Method) -> Vec<Arc<Route>> {
        self.read_state().table.bucket(method).to_vec()
    }

    /// Handlers registered on this application; mounted copies are not counted
    #[must_use]
    pub fn handlers_count(&self) -> usize {
        self.read_state().table.handlers_count()
    }

    /// Name the most recently registered route
    ///
    /// A route registered through a named group gets the group's name as a
    /// prefix.
    ///
    /// # Errors
    ///
    /// `Error::NoRoute` if nothing has been registered yet, `Error::Hook` if
    /// an onName listener fails.
    pub fn name(&self, name: &str) -> Result<&Self> {
        let named = self.write_state().table.name_latest(name)?;
        debug!(name = %named.name, path = %named.path, "Route named");
        self.inner.hooks.execute_on_name(&named)?;
        Ok(self)
    }

    pub(crate) fn register_route(
        &self,
        methods: &[&str],
        path: &str,
        group: Option<Arc<GroupInfo>>,
        handler: Option<Handler>,
        middleware: Vec<Handler>,
    ) -> Result<()> {
        let methods = methods
            .iter()
            .map(|m| m.parse::<Method>())
            .collect::<Result<Vec<_>>>()?;

        let mut chain = middleware;
        chain.extend(handler);
        if chain.is_empty() {
            return Err(Error::EmptyHandlerChain {
                path: path.to_string(),
            });
        }
        let path = normalize_path(path);

        for method in methods {
            let route = Route::new(method, path.clone(), group.clone(), chain.clone(), false)?;
            let (stacked, mount_path) = {
                let mut state = self.write_state();
                let stacked = state.table.add_route(route, false);
                (stacked, state.mounts.mount_path().to_string())
            };
            self.inner.hooks.execute_on_route(&stacked, &mount_path)?;
        }
        Ok(())
    }

    /// Acquire a pooled context bound to `request`
    ///
    /// The context goes back to the pool when the guard drops.
    pub fn acquire_ctx(&self, request: Request, response: Response) -> PooledCtx<'_> {
        self.inner.pool.acquire(request, response)
    }

    /// Dispatch one request through the matching route's handler chain
    ///
    /// # Errors
    ///
    /// `Error::MethodNotAllowed` for methods outside the supported five,
    /// `Error::RouteNotFound` when nothing matches, otherwise whatever the
    /// handler chain returns.
    pub fn handle(&self, request: Request) -> Result<Response> {
        self.ensure_mounts()?;

        let method = Method::try_from(request.method())?;
        let found = self.read_state().table.find(method, request.path());
        let Some((route, params)) = found else {
            return Err(Error::RouteNotFound {
                method: method.to_string(),
                path: request.path().to_string(),
            });
        };

        debug!(method = %method, path = %request.path(), route = %route.path, "Route matched");
        let mut ctx = self.acquire_ctx(request, Response::new());
        ctx.bind(route, params);
        if let Err(err) = ctx.run() {
            warn!(method = %method, path = %ctx.path(), error = %err, "Handler chain failed");
            return Err(err);
        }
        Ok(ctx.take_response())
    }

    /// Report that the listener is ready
    ///
    /// Pending mounts are merged first, then onListen listeners run.
    ///
    /// # Errors
    ///
    /// Configuration errors from mount merging, or `Error::Hook`.
    pub fn listening(&self, data: &ListenData) -> Result<()> {
        self.ensure_mounts()?;
        info!(
            app = %self.inner.config.app_name,
            host = %data.host,
            port = %data.port,
            tls = data.tls,
            routes = self.routes().len(),
            "Listening"
        );
        self.inner.hooks.execute_on_listen(data)
    }

    /// Run shutdown listeners
    ///
    /// # Errors
    ///
    /// `Error::Hook` if an onShutdown listener fails.
    pub fn shutdown(&self) -> Result<()> {
        info!(app = %self.inner.config.app_name, "Shutting down");
        self.inner.hooks.execute_on_shutdown()
    }

    /// Report a spawned child process
    ///
    /// # Errors
    ///
    /// `Error::Hook` if an onFork listener fails.
    pub fn forked(&self, pid: u32) -> Result<()> {
        debug!(pid, "Child process forked");
        self.inner.hooks.execute_on_fork(pid)
    }
}

impl Router for App {
    fn register(
        &self,
        methods: &[&str],
        path: &str,
        handler: Option<Handler>,
        middleware: Vec<Handler>,
    ) -> Result<()> {
        self.register_route(methods, path, None, handler, middleware)
    }

    fn group(&self, prefix: &str) -> Result<Group> {
        let group = Group::new(self.clone(), None, prefix);
        self.inner.hooks.execute_on_group(&group)?;
        Ok(group)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("App")
            .field("name", &self.inner.config.app_name)
            .field("mount_path", &state.mounts.mount_path())
            .field("handlers", &state.table.handlers_count())
            .field("hooks", &self.inner.hooks)
            .field("pool", &self.inner.pool)
            .finish_non_exhaustive()
    }
}
