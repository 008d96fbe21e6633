//! Private JSON client for the Vigil alerting API
//!
//! This crate provides a minimal HTTP client specifically designed for
//! the request/response endpoints of the alerting backend. It builds
//! URLs relative to a configured base, attaches bearer tokens, and maps
//! transport failures and non-success statuses onto [`HttpError`].
//!
//! It holds no per-user state and never retries: callers decide what a
//! failure means.

mod error;

pub use error::HttpError;

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;
use url::Url;

/// Timeouts applied to every request
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Time allowed to establish the TCP/TLS connection
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Time allowed for the whole request including the body
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A single API request, built fluently and passed to [`HttpClient::send`]
///
/// ```rust,ignore
/// let request = Request::get("/events/user/7")
///     .query("page", 1)
///     .query("unread_only", false)
///     .bearer(&token);
/// let page: EventPage = client.send(request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Request<'a> {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<serde_json::Value>,
    bearer: Option<&'a str>,
}

impl<'a> Request<'a> {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter
    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, HttpError> {
        let value = serde_json::to_value(body).map_err(|e| HttpError::Parse(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attach an `Authorization: Bearer <token>` header
    pub fn bearer(mut self, token: &'a str) -> Self {
        self.bearer = Some(token);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A minimal JSON client bound to one API base URL
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client for `base_url` with default timeouts
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        Self::with_config(base_url, HttpConfig::default())
    }

    /// Create a client for `base_url` with explicit timeouts
    pub fn with_config(base_url: &str, config: HttpConfig) -> Result<Self, HttpError> {
        let parsed = Url::parse(base_url).map_err(|e| HttpError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                base_url,
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HttpError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL every request path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and decode the JSON response body into `T`
    pub async fn send<T: DeserializeOwned>(&self, request: Request<'_>) -> Result<T, HttpError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| HttpError::Parse(format!("{} (body: {})", e, body)))
    }

    /// Send a request whose response body carries nothing the caller needs
    pub async fn send_ack(&self, request: Request<'_>) -> Result<(), HttpError> {
        self.execute(request).await.map(|_| ())
    }

    async fn execute(&self, request: Request<'_>) -> Result<String, HttpError> {
        let url = format!("{}{}", self.base_url, request.path);
        trace!(method = %request.method, url = %url, "sending request");

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;

        trace!(method = %request.method, url = %url, status = status.as_u16(), "received response");

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(HttpError::Unauthorized(text));
        }
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

fn map_transport_error(error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Network(format!("request timed out: {}", error))
    } else if error.is_decode() {
        HttpError::Parse(error.to_string())
    } else {
        HttpError::Network(error.to_string())
    }
}
