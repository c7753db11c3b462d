//! # HTTP Request
//!
//! Owned request data handed to a [`Ctx`](crate::ctx::Ctx).
//!
//! The body is collected once up front and the query string is decoded on
//! construction, so handlers never touch the transport.

use crate::error::{Error, Result};
use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, HOST};
use std::net::SocketAddr;

/// An HTTP request
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: hyper::Method,
    path: String,
    query_string: Option<String>,
    query_params: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    scheme: Option<String>,
}

impl Request {
    /// Build a request from a method and a path with optional query string
    #[must_use]
    pub fn new(method: hyper::Method, target: &str) -> Self {
        let (path, query_string) = match target.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (target.to_string(), None),
        };
        let query_params = parse_query_string(query_string.as_deref());

        Self {
            method,
            path,
            query_string,
            query_params,
            ..Self::default()
        }
    }

    /// Add a header; invalid names or values are ignored
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the peer address
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Collect a hyper request, refusing bodies over `max_body_size`
    ///
    /// # Errors
    ///
    /// `Error::PayloadTooLarge` when the declared or actual body size exceeds
    /// the limit, `Error::BadRequest` when the body cannot be read.
    pub async fn from_hyper<B>(
        req: hyper::Request<B>,
        remote_addr: Option<SocketAddr>,
        max_body_size: usize,
    ) -> Result<Self>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        if let Some(declared) = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
        {
            if declared > max_body_size {
                return Err(Error::PayloadTooLarge {
                    limit: max_body_size,
                    actual: declared,
                });
            }
        }

        let body = body
            .collect()
            .await
            .map_err(|e| Error::BadRequest {
                reason: e.to_string(),
            })?
            .to_bytes();
        if body.len() > max_body_size {
            return Err(Error::PayloadTooLarge {
                limit: max_body_size,
                actual: body.len(),
            });
        }

        let query_string = parts.uri.query().map(String::from);
        let query_params = parse_query_string(query_string.as_deref());

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query_string,
            query_params,
            headers: parts.headers,
            body,
            remote_addr,
            scheme: parts.uri.scheme_str().map(String::from),
        })
    }

    /// HTTP method
    #[must_use]
    pub fn method(&self) -> &hyper::Method {
        &self.method
    }

    /// Request path (without query string)
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set or override a header
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(n), Ok(v)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(n, v);
        }
    }

    /// All request headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a query parameter
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Decoded query pairs in request order, duplicates included
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// Get raw query string
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Request body
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Host header, or empty
    #[must_use]
    pub fn host(&self) -> &str {
        self.headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// URI scheme, `http` unless the request carried one
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.scheme.as_deref().unwrap_or("http")
    }

    /// Peer address
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}

/// Parse query string into ordered pairs
fn parse_query_string(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            q.split('&')
                .filter(|pair| !pair.is_empty())
                .map(|pair| {
                    let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                    (url_decode(key), url_decode(value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Percent and `+` decoding; invalid escapes are kept verbatim
fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let decoded = s
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                if let Some(byte) = decoded {
                    out.push(byte);
                    i += 2;
                } else {
                    out.push(b'%');
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    #[test]
    fn test_parse_query_string_simple() {
        let result = parse_query_string(Some("page=1&limit=10"));
        assert_eq!(
            result,
            vec![
                ("page".to_string(), "1".to_string()),
                ("limit".to_string(), "10".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_query_string_empty() {
        assert!(parse_query_string(None).is_empty());
        assert!(parse_query_string(Some("")).is_empty());
    }

    #[test]
    fn test_parse_query_string_flag_without_value() {
        let result = parse_query_string(Some("debug&x=1"));
        assert_eq!(result[0], ("debug".to_string(), String::new()));
    }

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("hello+world"), "hello world");
        assert_eq!(url_decode("hello%20world"), "hello world");
        assert_eq!(url_decode("100%25"), "100%");
        assert_eq!(url_decode("caf%C3%A9"), "café");
        assert_eq!(url_decode("bad%zzescape"), "bad%zzescape");
        assert_eq!(url_decode("tail%2"), "tail%2");
    }

    #[test]
    fn test_request_new_splits_query() {
        let req = Request::new(hyper::Method::GET, "/search?q=rust&page=2")
            .with_header("Host", "example.com");
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query("q"), Some("rust"));
        assert_eq!(req.query("missing"), None);
        assert_eq!(req.query_string(), Some("q=rust&page=2"));
        assert_eq!(req.host(), "example.com");
        assert_eq!(req.scheme(), "http");
    }

    #[tokio::test]
    async fn test_from_hyper_collects_body() {
        let req = hyper::Request::builder()
            .method(hyper::Method::POST)
            .uri("/items?draft=true")
            .body(Full::new(Bytes::from_static(b"{\"a\":1}")))
            .unwrap();

        let parsed = Request::from_hyper(req, None, 1024).await.unwrap();
        assert_eq!(*parsed.method(), hyper::Method::POST);
        assert_eq!(parsed.path(), "/items");
        assert_eq!(parsed.query("draft"), Some("true"));
        assert_eq!(parsed.body().as_ref(), b"{\"a\":1}");
    }

    #[tokio::test]
    async fn test_from_hyper_rejects_large_body() {
        let req = hyper::Request::builder()
            .uri("/upload")
            .body(Full::new(Bytes::from(vec![0u8; 64])))
            .unwrap();

        let err = Request::from_hyper(req, None, 16).await.unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { limit: 16, actual: 64 }));
    }
}
