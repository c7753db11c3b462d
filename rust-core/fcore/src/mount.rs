//! # Sub-Application Mounting
//!
//! Mounting embeds one application's routes into another under a prefix.
//! The merge is deferred until the parent first dispatches or starts
//! listening, so routes the sub-application registers after being mounted
//! are still picked up. Each mount is merged exactly once; mounts added after
//! that point merge immediately.

use crate::app::App;
use crate::error::{Error, Result};
use crate::route::Route;
use crate::router::join_paths;
use tracing::{debug, info};

pub(crate) struct MountEntry {
    name: String,
    app: App,
    prefix: String,
    routes_merged: bool,
}

/// Mounted sub-applications of one application
#[derive(Default)]
pub(crate) struct MountRegistry {
    entries: Vec<MountEntry>,
    mount_path: String,
    /// Entry names, longest prefix first
    keys: Vec<String>,
    processed: bool,
}

impl MountRegistry {
    /// Prefix under which this application is reachable, empty at the root
    pub(crate) fn mount_path(&self) -> &str {
        &self.mount_path
    }

    fn entry(&self, name: &str) -> Option<&MountEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut MountEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    fn insert(&mut self, entry: MountEntry) {
        let len = entry.prefix.len();
        let at = self
            .keys
            .iter()
            .position(|key| self.entry(key).map_or(0, |e| e.prefix.len()) < len)
            .unwrap_or(self.keys.len());
        self.keys.insert(at, entry.name.clone());
        self.entries.push(entry);
    }

    fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| !e.routes_merged)
    }

    /// Unmerged entries in key order
    fn pending(&self) -> Vec<(String, App, String)> {
        self.keys
            .iter()
            .filter_map(|key| self.entry(key))
            .filter(|e| !e.routes_merged)
            .map(|e| (e.name.clone(), e.app.clone(), e.prefix.clone()))
            .collect()
    }
}

impl App {
    /// Mount `sub` under `prefix`, keyed by `name`
    ///
    /// `sub`'s onMount listeners run with this application as the parent.
    ///
    /// # Errors
    ///
    /// `Error::InvalidMount` when mounting an application into itself,
    /// creating a cycle, or reusing a name; `Error::Hook` if an onMount
    /// listener fails.
    pub fn mount(&self, name: &str, sub: &App, prefix: &str) -> Result<&Self> {
        let invalid = |reason: &str| Error::InvalidMount {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if self.ptr_eq(sub) {
            return Err(invalid("an application cannot be mounted into itself"));
        }
        if sub.reaches(self) {
            return Err(invalid("mount would create a cycle"));
        }

        // An entry inserted before the gate closes is seen by the gate's
        // final pending check; one inserted after it must merge here.
        let (mount_path, merge_now) = {
            let mut state = self.write_state();
            if state.mounts.entry(name).is_some() {
                return Err(invalid("name already mounted"));
            }
            state.mounts.insert(MountEntry {
                name: name.to_string(),
                app: sub.clone(),
                prefix: prefix.to_string(),
                routes_merged: false,
            });
            (
                join_paths(state.mounts.mount_path(), prefix),
                state.mounts.processed,
            )
        };
        sub.set_mount_path(&mount_path);
        info!(name, prefix, mount_path = %mount_path, "Application mounted");

        sub.hooks().execute_on_mount(self)?;

        if merge_now {
            self.merge_mounts()?;
        }
        Ok(self)
    }

    /// Names of mounted applications, longest prefix first
    #[must_use]
    pub fn mounted_apps(&self) -> Vec<String> {
        self.read_state().mounts.keys.clone()
    }

    /// Prefix under which this application is reachable, empty at the root
    #[must_use]
    pub fn mount_path(&self) -> String {
        self.read_state().mounts.mount_path().to_string()
    }

    /// Whether `target` is mounted somewhere below this application
    fn reaches(&self, target: &App) -> bool {
        let children: Vec<App> = self
            .read_state()
            .mounts
            .entries
            .iter()
            .map(|e| e.app.clone())
            .collect();
        children
            .iter()
            .any(|child| child.ptr_eq(target) || child.reaches(target))
    }

    fn set_mount_path(&self, path: &str) {
        let children: Vec<(App, String)> = {
            let mut state = self.write_state();
            path.clone_into(&mut state.mounts.mount_path);
            state
                .mounts
                .entries
                .iter()
                .map(|e| (e.app.clone(), e.prefix.clone()))
                .collect()
        };
        for (child, prefix) in children {
            child.set_mount_path(&join_paths(path, &prefix));
        }
    }

    /// Merge every pending mount, once
    ///
    /// The gate closes only under the same write guard that observed no
    /// pending entry.
    pub(crate) fn ensure_mounts(&self) -> Result<()> {
        loop {
            if self.read_state().mounts.processed {
                return Ok(());
            }
            self.merge_mounts()?;

            let mut state = self.write_state();
            if state.mounts.processed {
                return Ok(());
            }
            if state.mounts.has_pending() {
                continue;
            }
            state.mounts.processed = true;
            debug!(
                mounts = state.mounts.entries.len(),
                routes = state.table.routes().len(),
                "Sub-applications processed"
            );
            return Ok(());
        }
    }

    fn merge_mounts(&self) -> Result<()> {
        let pending = self.read_state().mounts.pending();

        for (name, sub, prefix) in pending {
            sub.ensure_mounts()?;
            let merged = sub
                .routes()
                .iter()
                .map(|route| {
                    Route::new(
                        route.method,
                        join_paths(&prefix, &route.path),
                        route.group.clone(),
                        route.handlers.clone(),
                        true,
                    )
                })
                .collect::<Result<Vec<_>>>()?;

            let mut state = self.write_state();
            let Some(entry) = state.mounts.entry_mut(&name) else {
                continue;
            };
            if entry.routes_merged {
                continue;
            }
            entry.routes_merged = true;

            let count = merged.len();
            for route in merged {
                state.table.add_route(route, true);
            }
            debug!(name = %name, prefix = %prefix, routes = count, "Mounted routes merged");
        }
        Ok(())
    }
}
