//! # fcore
//!
//! Routing and request-context core for the fcore web framework.
//! Provides the route table, middleware continuation, route groups,
//! sub-application mounting and lifecycle hooks that a server embeds.
//!
//! ## Architecture
//!
//! Registration builds a method-indexed route table. At request time a
//! pooled [`Ctx`] is bound to the first matching route and its handler
//! chain is driven by handlers calling [`Ctx::next`] themselves.
//!
//! ## Modules
//!
//! - `app` - Framework instance, registration and dispatch
//! - `router` - Method enumeration, route table and the `Router` trait
//! - `route` - Route metadata and handler type
//! - `path` - Path pattern compilation and matching
//! - `group` - Nested prefix scopes
//! - `hooks` - Lifecycle listeners
//! - `ctx` - Per-request context and middleware continuation
//! - `pool` - Context reuse
//! - `locals` - Request-local values
//! - `request` / `response` - Owned HTTP request and response
//! - `server` - Hyper adapter
//! - `json` - JSON decoding with simd-json
//! - `types` - Parameter types and conversion
//! - `config` - Application settings
//! - `logging` - Tracing subscriber setup
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod app;
pub mod config;
pub mod ctx;
pub mod error;
pub mod group;
pub mod hooks;
pub mod json;
pub mod locals;
pub mod logging;
mod mount;
pub mod path;
pub mod pool;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
mod server;
pub mod types;

pub use app::App;
pub use config::Config;
pub use ctx::Ctx;
pub use error::{Error, Result};
pub use group::{Group, GroupInfo};
pub use hooks::{HookKind, Hooks, ListenData};
pub use json::{parse_json, to_json};
pub use locals::Locals;
pub use logging::init_tracing;
pub use path::{PathParams, RoutePattern};
pub use request::Request;
pub use response::Response;
pub use route::{handler, Handler, Route};
pub use router::{Method, Router};
pub use types::{ParamType, ParamValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
