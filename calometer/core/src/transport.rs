//! HTTP transport for the Calometer backend.
//!
//! [`Transport`] is the seam between the normalizer and the wire. [`HttpTransport`] is the real
//! implementation: a `reqwest` client with a cookie jar, so the backend's session cookie rides
//! along on every call.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::TransportError;

/// HTTP methods the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One backend call, addressed by endpoint path relative to the configured origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint path, e.g. [`paths::LOGIN`](crate::api::paths::LOGIN).
    pub path: String,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Build a request.
    pub fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }
}

/// A completed HTTP exchange before any interpretation of the body.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Whether the final url differs from the requested one.
    pub redirected: bool,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

/// Moves an [`ApiRequest`] over the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the call. Only failures to complete the exchange are errors; any HTTP status is a
    /// successful [`RawResponse`].
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport with a shared cookie jar.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    origin: Url,
    jar: Arc<Jar>,
}

impl HttpTransport {
    /// Client for the configured origin with an empty cookie jar.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::with_jar(config, Arc::new(Jar::default()))
    }

    /// Client sharing an existing cookie jar.
    pub fn with_jar(config: &ClientConfig, jar: Arc<Jar>) -> Result<Self, TransportError> {
        let base_url = config
            .base_url()
            .map_err(|err| TransportError::InvalidUrl {
                url: config.api_url.clone(),
                reason: err.to_string(),
            })?;
        let origin = parse_url(&base_url)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut builder = Client::builder()
            .cookie_provider(jar.clone())
            .default_headers(default_headers);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            origin,
            jar,
        })
    }

    /// Origin that endpoint paths are appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cookies the jar would send to the backend, in `Cookie` header form (`a=1; b=2`).
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.origin)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .filter(|header| !header.trim().is_empty())
    }

    /// Seed the jar from a header previously returned by [`cookie_header`](Self::cookie_header).
    pub fn restore_cookies(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|pair| pair.contains('=')) {
            self.jar.add_cookie_str(pair, &self.origin);
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let url = parse_url(&format!("{}{}", self.base_url, request.path))?;
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let redirected = response.url() != &url;
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!(
            method = request.method.as_str(),
            path = %request.path,
            status,
            redirected,
            bytes = body.len(),
            "backend call completed"
        );

        Ok(RawResponse {
            status,
            redirected,
            headers,
            body,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, TransportError> {
    Url::parse(raw).map_err(|err| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })
}
