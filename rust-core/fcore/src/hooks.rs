//! # Lifecycle Hooks
//!
//! Synchronous listeners for registration and lifecycle events.
//!
//! Listeners run in subscription order on the thread that triggered the
//! event. The first failing listener stops dispatch; its error is wrapped in
//! `Error::Hook` and returned to the caller of the triggering operation.

use crate::app::App;
use crate::error::{Error, Result};
use crate::group::Group;
use crate::route::Route;
use crate::router::join_paths;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Data reported to onListen listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenData {
    /// Bound host
    pub host: String,
    /// Bound port
    pub port: String,
    /// Whether TLS is terminated by the listener
    pub tls: bool,
}

/// Listener for route registration and route naming
pub type OnRouteHandler = Arc<dyn Fn(&Route) -> Result<()> + Send + Sync>;
/// Listener for route naming
pub type OnNameHandler = OnRouteHandler;
/// Listener for group creation
pub type OnGroupHandler = Arc<dyn Fn(&Group) -> Result<()> + Send + Sync>;
/// Listener for group naming
pub type OnGroupNameHandler = OnGroupHandler;
/// Listener for the listener becoming ready
pub type OnListenHandler = Arc<dyn Fn(&ListenData) -> Result<()> + Send + Sync>;
/// Listener for shutdown
pub type OnShutdownHandler = Arc<dyn Fn() -> Result<()> + Send + Sync>;
/// Listener for prefork children, given the child's process id
pub type OnForkHandler = Arc<dyn Fn(u32) -> Result<()> + Send + Sync>;
/// Listener for being mounted, given the parent application
pub type OnMountHandler = Arc<dyn Fn(&App) -> Result<()> + Send + Sync>;

/// The eight event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// A route was added
    Route,
    /// A route was named
    Name,
    /// A group was created
    Group,
    /// A group was named
    GroupName,
    /// The listener started
    Listen,
    /// The application is shutting down
    Shutdown,
    /// A prefork child was spawned
    Fork,
    /// The application was mounted into another
    Mount,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Route => "onRoute",
            Self::Name => "onName",
            Self::Group => "onGroup",
            Self::GroupName => "onGroupName",
            Self::Listen => "onListen",
            Self::Shutdown => "onShutdown",
            Self::Fork => "onFork",
            Self::Mount => "onMount",
        })
    }
}

#[derive(Default)]
struct Listeners {
    on_route: Vec<OnRouteHandler>,
    on_name: Vec<OnNameHandler>,
    on_group: Vec<OnGroupHandler>,
    on_group_name: Vec<OnGroupNameHandler>,
    on_listen: Vec<OnListenHandler>,
    on_shutdown: Vec<OnShutdownHandler>,
    on_fork: Vec<OnForkHandler>,
    on_mount: Vec<OnMountHandler>,
}

/// Per-application listener registry
#[derive(Default)]
pub struct Hooks {
    listeners: RwLock<Listeners>,
}

/// Run `listeners` in order, stopping at the first failure
fn run<H>(kind: HookKind, listeners: Vec<H>, call: impl Fn(&H) -> Result<()>) -> Result<()> {
    for listener in &listeners {
        if let Err(err) = call(listener) {
            warn!(hook = %kind, error = %err, "Hook aborted operation");
            return Err(Error::hook(kind, err));
        }
    }
    Ok(())
}

impl Hooks {
    fn with<R>(&self, f: impl FnOnce(&mut Listeners) -> R) -> R {
        f(&mut self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner))
    }

    fn snapshot<H: Clone>(&self, pick: impl FnOnce(&Listeners) -> &Vec<H>) -> Vec<H> {
        pick(&self.listeners.read().unwrap_or_else(PoisonError::into_inner)).clone()
    }

    /// Subscribe to route registration
    pub fn on_route<F>(&self, f: F)
    where
        F: Fn(&Route) -> Result<()> + Send + Sync + 'static,
    {
        self.with(|l| l.on_route.push(Arc::new(f)));
    }

    /// Subscribe to route naming
    pub fn on_name<F>(&self, f: F)
    where
        F: Fn(&Route) -> Result<()> + Send + Sync + 'static,
    {
        self.with(|l| l.on_name.push(Arc::new(f)));
    }

    /// Subscribe to group creation
    pub fn on_group<F>(&self, f: F)
    where
        F: Fn(&Group) -> Result<()> + Send + Sync + 'static,
    {
        self.with(|l| l.on_group.push(Arc::new(f)));
    }

    /// Subscribe to group naming
    pub fn on_group_name<F>(&self, f: F)
    where
        F: Fn(&Group) -> Result<()> + Send + Sync + 'static,
    {
        self.with(|l| l.on_group_name.push(Arc::new(f)));
    }

    /// Subscribe to the listener becoming ready
    pub fn on_listen<F>(&self, f: F)
    where
        F: Fn(&ListenData) -> Result<()> + Send + Sync + 'static,
    {
        self.with(|l| l.on_listen.push(Arc::new(f)));
    }

    /// Subscribe to shutdown
    pub fn on_shutdown<F>(&self, f: F)
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.with(|l| l.on_shutdown.push(Arc::new(f)));
    }

    /// Subscribe to prefork child creation
    pub fn on_fork<F>(&self, f: F)
    where
        F: Fn(u32) -> Result<()> + Send + Sync + 'static,
    {
        self.with(|l| l.on_fork.push(Arc::new(f)));
    }

    /// Subscribe to this application being mounted
    pub fn on_mount<F>(&self, f: F)
    where
        F: Fn(&App) -> Result<()> + Send + Sync + 'static,
    {
        self.with(|l| l.on_mount.push(Arc::new(f)));
    }

    /// Number of listeners subscribed to `kind`
    #[must_use]
    pub fn len(&self, kind: HookKind) -> usize {
        let l = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        match kind {
            HookKind::Route => l.on_route.len(),
            HookKind::Name => l.on_name.len(),
            HookKind::Group => l.on_group.len(),
            HookKind::GroupName => l.on_group_name.len(),
            HookKind::Listen => l.on_listen.len(),
            HookKind::Shutdown => l.on_shutdown.len(),
            HookKind::Fork => l.on_fork.len(),
            HookKind::Mount => l.on_mount.len(),
        }
    }

    /// Report a route, with `mount_path` prepended to its path
    pub(crate) fn execute_on_route(&self, route: &Route, mount_path: &str) -> Result<()> {
        let listeners = self.snapshot(|l| &l.on_route);
        if listeners.is_empty() {
            return Ok(());
        }

        if mount_path.is_empty() {
            run(HookKind::Route, listeners, |h| h(route))
        } else {
            let mut reported = route.clone();
            reported.path = join_paths(mount_path, &route.path);
            run(HookKind::Route, listeners, |h| h(&reported))
        }
    }

    pub(crate) fn execute_on_name(&self, route: &Route) -> Result<()> {
        run(HookKind::Name, self.snapshot(|l| &l.on_name), |h| h(route))
    }

    pub(crate) fn execute_on_group(&self, group: &Group) -> Result<()> {
        run(HookKind::Group, self.snapshot(|l| &l.on_group), |h| h(group))
    }

    pub(crate) fn execute_on_group_name(&self, group: &Group) -> Result<()> {
        run(HookKind::GroupName, self.snapshot(|l| &l.on_group_name), |h| {
            h(group)
        })
    }

    pub(crate) fn execute_on_listen(&self, data: &ListenData) -> Result<()> {
        run(HookKind::Listen, self.snapshot(|l| &l.on_listen), |h| h(data))
    }

    pub(crate) fn execute_on_shutdown(&self) -> Result<()> {
        run(HookKind::Shutdown, self.snapshot(|l| &l.on_shutdown), |h| h())
    }

    pub(crate) fn execute_on_fork(&self, pid: u32) -> Result<()> {
        run(HookKind::Fork, self.snapshot(|l| &l.on_fork), |h| h(pid))
    }

    pub(crate) fn execute_on_mount(&self, parent: &App) -> Result<()> {
        run(HookKind::Mount, self.snapshot(|l| &l.on_mount), |h| h(parent))
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_route", &self.len(HookKind::Route))
            .field("on_mount", &self.len(HookKind::Mount))
            .finish_non_exhaustive()
    }
}
