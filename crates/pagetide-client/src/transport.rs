//! Transport abstraction and reqwest-backed implementation
//!
//! The client issues requests through the [`Transport`] trait so the request
//! layer, retry protocol, and pagination aggregator can be exercised without
//! a network. Transport-level concerns (TLS, redirects, connection pooling,
//! timeouts) belong to the implementation behind the trait.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn Transport>`).

use std::future::Future;
use std::pin::Pin;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

/// The network call failed outright; no HTTP response was obtained.
///
/// Distinct from `Error::Http`, which carries a response with status >= 400.
#[derive(Debug, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// One outgoing request. Constructed per call; the expiry retry path
/// rewrites only the Authorization header and replays the same value.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Attempt to parse the response body as JSON, falling back to a raw
    /// string value when it does not parse.
    pub expect_json: bool,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: HeaderMap::new(),
            body: None,
            expect_json: true,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// One HTTP response, with the body already normalized to a JSON value
/// (or a raw string when it did not parse).
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Value,
}

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<Response, TransportError>> + Send + 'a>>;

/// Abstraction over the HTTP collaborator that actually moves bytes.
pub trait Transport: Send + Sync {
    fn issue(&self, request: Request) -> TransportFuture<'_>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn issue(&self, request: Request) -> TransportFuture<'_> {
        Box::pin(async move {
            let mut builder = self
                .http
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError(format!("request failed: {e}")))?;

            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let text = response
                .text()
                .await
                .map_err(|e| TransportError(format!("reading response body failed: {e}")))?;

            let body = if request.expect_json {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            } else {
                Value::String(text)
            };

            Ok(Response {
                status,
                headers,
                body,
            })
        })
    }
}
