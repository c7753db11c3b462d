//! # Error Handling
//!
//! Centralized error types for the fcore routing engine.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Errors fall into two families:
//!
//! - **Configuration** errors are raised while wiring routes, groups, hooks
//!   and mounts. They are meant to stop the process before serving begins.
//! - **Request** errors surface while a request travels through a handler
//!   chain and are returned to the dispatch entry point unchanged.

use crate::hooks::HookKind;
use crate::types::ParamType;
use hyper::StatusCode;
use thiserror::Error;

/// Result type alias for fcore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the fcore runtime
#[derive(Error, Debug)]
pub enum Error {
    /// A method outside GET, POST, PUT, PATCH and DELETE was registered
    #[error("Invalid method: {method}")]
    InvalidMethod {
        /// The rejected method string
        method: String,
    },

    /// A route was registered without any handler or middleware
    #[error("Missing handler/middleware in route: {path}")]
    EmptyHandlerChain {
        /// Path of the offending registration
        path: String,
    },

    /// Invalid route pattern provided
    #[error("Invalid route pattern: {pattern}: {reason}")]
    MalformedPattern {
        /// The invalid pattern
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A mount request that would corrupt the mount tree
    #[error("Invalid mount {name}: {reason}")]
    InvalidMount {
        /// Mount name
        name: String,
        /// Reason the mount was refused
        reason: String,
    },

    /// A route name was assigned before any route was registered
    #[error("Cannot name route {name}: no route registered yet")]
    NoRoute {
        /// The requested name
        name: String,
    },

    /// A lifecycle listener failed and aborted the triggering operation
    #[error("{kind} hook failed: {source}")]
    Hook {
        /// Event the listener was subscribed to
        kind: HookKind,
        /// The listener's own error
        #[source]
        source: Box<Error>,
    },

    /// Router failed to match the requested path
    #[error("No route found for {method} {path}")]
    RouteNotFound {
        /// Request method
        method: String,
        /// The path that wasn't matched
        path: String,
    },

    /// Request used a method the router does not serve
    #[error("Method not allowed: {method}")]
    MethodNotAllowed {
        /// The request method
        method: String,
    },

    /// A typed accessor found a value it could not convert
    #[error("Cannot parse {key}={value:?} as {expected}")]
    Parse {
        /// Query or path parameter name
        key: String,
        /// Raw value received
        value: String,
        /// The requested type
        expected: ParamType,
    },

    /// Request body could not be decoded
    #[error("Decode error: {reason}")]
    Decode {
        /// Decoder message
        reason: String,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },

    /// Request could not be read from the transport
    #[error("Bad request: {reason}")]
    BadRequest {
        /// Why the request was rejected
        reason: String,
    },

    /// A handler ended the request with an explicit status
    #[error("{message}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Message sent to the client
        message: String,
    },

    /// Any application error returned from a handler
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl Error {
    /// Create an error carrying an explicit HTTP status
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn hook(kind: HookKind, source: Self) -> Self {
        Self::Hook {
            kind,
            source: Box::new(source),
        }
    }

    /// Whether this error belongs to registration-time wiring
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidMethod { .. }
                | Self::EmptyHandlerChain { .. }
                | Self::MalformedPattern { .. }
                | Self::InvalidMount { .. }
                | Self::NoRoute { .. }
        )
    }

    /// HTTP status the dispatch adapter answers with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Parse { .. } | Self::Decode { .. } | Self::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Status { code, .. } => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
