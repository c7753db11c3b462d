//! # Request Context
//!
//! Per-request mutable state that drives a handler chain.
//!
//! ## Lifecycle
//!
//! A context sits idle in the application's pool until it is reset with a
//! request and response. Dispatch then binds the matched route and invokes
//! its first handler. Each handler decides whether the chain continues by
//! calling [`Ctx::next`]; there is no implicit advancement. Releasing the
//! context clears every per-request field before it goes back to the pool.

use crate::app::{App, AppInner};
use crate::error::Result;
use crate::json::{self, CONTENT_TYPE_JSON};
use crate::locals::Locals;
use crate::path::PathParams;
use crate::request::Request;
use crate::response::Response;
use crate::route::Route;
use crate::types::{convert_param, ParamType, ParamValue};
use hyper::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Mutable state of one in-flight request
pub struct Ctx {
    app: Weak<AppInner>,
    request: Request,
    response: Response,
    route: Option<Arc<Route>>,
    index: usize,
    matched: bool,
    params: PathParams,
    locals: Locals,
}

impl Ctx {
    pub(crate) fn new(app: Weak<AppInner>) -> Self {
        Self {
            app,
            request: Request::default(),
            response: Response::default(),
            route: None,
            index: 0,
            matched: false,
            params: PathParams::default(),
            locals: Locals::new(),
        }
    }

    /// Bind a request and response; the handler index starts over
    pub fn reset(&mut self, request: Request, response: Response) {
        self.request = request;
        self.response = response;
        self.index = 0;
        self.matched = false;
    }

    pub(crate) fn bind(&mut self, route: Arc<Route>, params: PathParams) {
        self.route = Some(route);
        self.params = params;
        self.matched = true;
    }

    /// Invoke the first handler of the bound route
    pub(crate) fn run(&mut self) -> Result<()> {
        self.index = 0;
        let Some(route) = self.route.clone() else {
            return Ok(());
        };
        match route.handlers.first() {
            Some(first) => first(self),
            None => Ok(()),
        }
    }

    /// Drop every per-request reference so a pooled context holds nothing stale
    pub(crate) fn release(&mut self) {
        self.request = Request::default();
        self.response = Response::default();
        self.route = None;
        self.index = 0;
        self.matched = false;
        self.params.clear();
        self.locals.clear();
    }

    pub(crate) fn take_response(&mut self) -> Response {
        std::mem::take(&mut self.response)
    }

    /// Run the next handler in the chain
    ///
    /// Returns the handler's result. Past the end of the chain this is a
    /// no-op returning `Ok(())`.
    ///
    /// # Errors
    ///
    /// Whatever the next handler returns, unchanged.
    pub fn next(&mut self) -> Result<()> {
        let Some(route) = self.route.clone() else {
            return Ok(());
        };
        self.index += 1;
        match route.handlers.get(self.index) {
            Some(handler) => handler(self),
            None => Ok(()),
        }
    }

    /// The owning application, while it is alive
    #[must_use]
    pub fn app(&self) -> Option<App> {
        self.app.upgrade().map(App::from_inner)
    }

    /// The matched route
    #[must_use]
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    /// Whether a route has been bound
    #[must_use]
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Index of the handler currently running
    #[must_use]
    pub fn handler_index(&self) -> usize {
        self.index
    }

    /// The current request
    #[must_use]
    pub fn req(&self) -> &Request {
        &self.request
    }

    /// The response being built
    #[must_use]
    pub fn res(&self) -> &Response {
        &self.response
    }

    /// Mutable access to the response being built
    pub fn res_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Request path
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Request method
    #[must_use]
    pub fn method(&self) -> &hyper::Method {
        self.request.method()
    }

    /// Scheme and host, e.g. `http://example.com`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.request.scheme(), self.request.host())
    }

    /// Client address: the proxy header when present, else the peer address
    #[must_use]
    pub fn ip(&self) -> String {
        if let Some(app) = self.app.upgrade() {
            if let Some(forwarded) = self
                .request
                .header(&app.config.proxy_header)
                .filter(|v| !v.is_empty())
            {
                return forwarded.to_string();
            }
        }
        self.request
            .remote_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default()
    }

    /// Decode the JSON body
    ///
    /// # Errors
    ///
    /// `Error::Decode` if the body is not valid JSON for `T`.
    pub fn body_parser<T: DeserializeOwned>(&self) -> Result<T> {
        json::parse_json(self.request.body())
    }

    /// Path parameter captured by the matched route
    #[must_use]
    pub fn params(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// Path parameter, or `default` when absent or empty
    #[must_use]
    pub fn params_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.params(key).filter(|v| !v.is_empty()).unwrap_or(default)
    }

    /// Path parameter as an integer
    ///
    /// # Errors
    ///
    /// `Error::Parse` if the parameter is missing or not an integer.
    pub fn params_int(&self, key: &str) -> Result<i64> {
        let raw = self.params(key).unwrap_or_default();
        Ok(convert_param(key, raw, ParamType::Int)?
            .as_int()
            .unwrap_or_default())
    }

    /// Every captured path parameter
    #[must_use]
    pub fn all_params(&self) -> &PathParams {
        &self.params
    }

    /// First value of a query parameter
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.query(key)
    }

    /// Query parameter, or `default` when absent or empty
    #[must_use]
    pub fn query_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.query(key).filter(|v| !v.is_empty()).unwrap_or(default)
    }

    /// All query parameters; repeated keys have their values concatenated
    #[must_use]
    pub fn queries(&self) -> BTreeMap<String, String> {
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in self.request.query_pairs() {
            merged.entry(key.clone()).or_default().push_str(value);
        }
        merged
    }

    fn typed_query(&self, key: &str, param_type: ParamType) -> Result<Option<ParamValue>> {
        self.query(key)
            .map(|raw| convert_param(key, raw, param_type))
            .transpose()
    }

    /// Boolean query parameter; `default` only when the key is absent
    ///
    /// # Errors
    ///
    /// `Error::Parse` if the key is present but not a boolean literal.
    pub fn query_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self
            .typed_query(key, ParamType::Bool)?
            .and_then(|v| v.as_bool())
            .unwrap_or(default))
    }

    /// Float query parameter; `default` only when the key is absent
    ///
    /// # Errors
    ///
    /// `Error::Parse` if the key is present but not a float.
    pub fn query_float(&self, key: &str, default: f64) -> Result<f64> {
        Ok(self
            .typed_query(key, ParamType::Float)?
            .and_then(|v| v.as_float())
            .unwrap_or(default))
    }

    /// Integer query parameter; `default` only when the key is absent
    ///
    /// # Errors
    ///
    /// `Error::Parse` if the key is present but not a 32-bit integer.
    pub fn query_int(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self
            .typed_query(key, ParamType::Int)?
            .and_then(|v| v.as_int())
            .unwrap_or(default))
    }

    /// Read a request-local value
    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.locals.get(key)
    }

    /// Read a request-local value
    #[must_use]
    pub fn locals<T: 'static>(&self, key: &str) -> Option<&T> {
        self.locals.get(key)
    }

    /// Store a request-local value, visible to later handlers in the chain
    pub fn set_locals<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.locals.set(key, value);
    }

    /// The whole request-local store
    #[must_use]
    pub fn locals_store(&self) -> &Locals {
        &self.locals
    }

    /// Set the response status
    pub fn status(&mut self, code: u16) -> &mut Self {
        self.response.status = code;
        self
    }

    /// Set a response header
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.response.set_header(key, value);
        self
    }

    /// Append raw bytes to the response body
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` so handlers can end with it.
    pub fn send(&mut self, body: &[u8]) -> Result<()> {
        self.response.body_mut().extend_from_slice(body);
        Ok(())
    }

    /// Append text to the response body
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` so handlers can end with it.
    pub fn send_string(&mut self, body: &str) -> Result<()> {
        if self.response.header(CONTENT_TYPE.as_str()).is_none() {
            self.response
                .set_header(CONTENT_TYPE.as_str(), "text/plain; charset=utf-8");
        }
        self.send(body.as_bytes())
    }

    /// Serialize `data` as the JSON response body
    ///
    /// The content type is set before encoding starts. If encoding fails
    /// part of the document may already be in the body.
    ///
    /// # Errors
    ///
    /// `Error::Json` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<()> {
        self.response
            .set_header(CONTENT_TYPE.as_str(), CONTENT_TYPE_JSON);
        json::to_writer(self.response.body_mut(), data)
    }
}

impl fmt::Debug for Ctx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ctx")
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .field("route", &self.route.as_ref().map(|r| r.path.as_str()))
            .field("index", &self.index)
            .field("matched", &self.matched)
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}
