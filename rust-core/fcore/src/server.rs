//! # Hyper Adapter
//!
//! Bridges hyper requests into [`App::handle`]. Binding sockets, TLS and
//! process supervision belong to the embedding server; this module only
//! turns one hyper request into one hyper response.
//!
//! ```ignore
//! let app = app.clone();
//! let service = service_fn(move |req| {
//!     let app = app.clone();
//!     async move { app.handle_hyper(req, Some(remote_addr)).await }
//! });
//! ```

use crate::app::App;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use tracing::{error, info};

impl App {
    /// Serve one hyper request
    ///
    /// Never fails: dispatch errors become plain-text responses carrying
    /// the error's status code.
    ///
    /// # Errors
    ///
    /// The error type is [`Infallible`] so the call fits `service_fn`.
    pub async fn handle_hyper<B>(
        &self,
        req: hyper::Request<B>,
        remote_addr: Option<SocketAddr>,
    ) -> Result<hyper::Response<Full<Bytes>>, Infallible>
    where
        B: Body,
        B::Error: Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let version = req.version();

        let result = match Request::from_hyper(req, remote_addr, self.config().max_body_size).await
        {
            Ok(request) => self.handle(request),
            Err(err) => Err(err),
        };
        let response = result.unwrap_or_else(|err| error_response(&err));

        let peer = remote_addr.map(|a| a.to_string()).unwrap_or_default();
        info!(
            "    {} - \"{} {} {:?}\" {}",
            peer, method, path, version, response.status
        );
        Ok(response.into_hyper())
    }
}

fn error_response(err: &Error) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, status = status.as_u16(), "Request failed");
    }
    Response::text(status.as_u16(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::router::Router;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn request(method: hyper::Method, uri: &str, body: &'static [u8]) -> hyper::Request<Full<Bytes>> {
        hyper::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body)))
            .unwrap()
    }

    async fn body_of(res: hyper::Response<Full<Bytes>>) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_handle_hyper_ok() {
        let app = App::new();
        app.post("/echo", |c| {
            let body = c.req().body().clone();
            c.status(201);
            c.send(&body)
        })
        .unwrap();

        let res = app
            .handle_hyper(request(hyper::Method::POST, "/echo", b"ping"), None)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(body_of(res).await, "ping");
    }

    #[tokio::test]
    async fn test_handle_hyper_not_found() {
        let app = App::new();
        let res = app
            .handle_hyper(request(hyper::Method::GET, "/missing", b""), None)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(body_of(res).await.contains("/missing"));
    }

    #[tokio::test]
    async fn test_handle_hyper_error_mapping() {
        let app = App::new();
        app.get("/teapot", |_| Err(Error::status(418, "short and stout")))
            .unwrap();
        app.get("/count", |c| {
            let n = c.query_int("n", 0)?;
            c.send_string(&n.to_string())
        })
        .unwrap();

        let res = app
            .handle_hyper(request(hyper::Method::GET, "/teapot", b""), None)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);

        let res = app
            .handle_hyper(request(hyper::Method::GET, "/count?n=abc", b""), None)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .handle_hyper(request(hyper::Method::HEAD, "/count", b""), None)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_handle_hyper_payload_too_large() {
        let app = App::with_config(Config {
            max_body_size: 2,
            ..Config::default()
        });
        app.post("/upload", |_| Ok(())).unwrap();

        let res = tokio_test::block_on(
            app.handle_hyper(request(hyper::Method::POST, "/upload", b"too big"), None),
        )
        .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
