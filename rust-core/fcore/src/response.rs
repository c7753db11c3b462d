//! # HTTP Response
//!
//! The response sink a [`Ctx`](crate::ctx::Ctx) writes into while a handler
//! chain runs.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;

/// An HTTP response under construction
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    /// Create an empty 200 response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a text response
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut res = Self {
            status,
            ..Self::default()
        };
        res.set_header(CONTENT_TYPE.as_str(), "text/plain; charset=utf-8");
        res.body = body.into().into_bytes();
        res
    }

    /// Set or override a header; invalid names or values are ignored
    pub fn set_header(&mut self, key: &str, value: &str) {
        if let (Ok(n), Ok(v)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(n, v);
        }
    }

    /// Get a header value by name
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    /// All response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body written so far
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossily
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Writable body buffer
    pub fn body_mut(&mut self) -> &mut Vec<u8> {
        &mut self.body
    }

    /// Convert to hyper Response
    #[must_use]
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut res = hyper::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *res.headers_mut() = self.headers;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_default() {
        let res = Response::new();
        assert_eq!(res.status, 200);
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
    }

    #[test]
    fn test_response_text() {
        let res = Response::text(404, "Not Found");
        assert_eq!(res.status, 404);
        assert_eq!(res.body_string(), "Not Found");
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_invalid_header_ignored() {
        let mut res = Response::new();
        res.set_header("bad header", "x");
        assert!(res.headers().is_empty());
    }

    #[test]
    fn test_into_hyper() {
        let mut res = Response::new();
        res.status = 201;
        res.set_header("X-Request-Id", "abc");
        res.body_mut().extend_from_slice(b"created");

        let hyper_res = res.into_hyper();
        assert_eq!(hyper_res.status(), StatusCode::CREATED);
        assert_eq!(hyper_res.headers()["x-request-id"], "abc");
    }

    #[test]
    fn test_into_hyper_invalid_status() {
        let mut res = Response::new();
        res.status = 42;
        assert_eq!(res.into_hyper().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
