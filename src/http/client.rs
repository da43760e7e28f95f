//! HTTP client with retry and cancellation
//!
//! Provides the transport every other component goes through:
//! - Base URL joining and query parameter encoding
//! - Token header injection outside the authentication endpoints
//! - Automatic retries on throttling and gateway statuses
//! - Body decoding (JSON, then text, then bytes)
//! - Error classification into `HttpStatus` / `Http` / `Cancelled`

use super::body::{is_success_status, RequestBody, Response, ResponseBody, JSON_CONTENT_TYPE};
use super::retry::RetryPolicy;
use crate::auth::is_auth_path;
use crate::error::{Error, Result};
use crate::types::Method;
use crate::validate::QueryParams;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the API access token
pub const TOKEN_HEADER: &str = "Token";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Server root for all relative paths
    pub base_url: String,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            default_headers: HashMap::new(),
            user_agent: format!("catalog-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set total attempts for retryable statuses
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts.max(1);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, in order
    pub query: QueryParams,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: RequestBody,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override total attempts for this request
    pub max_attempts: Option<u32>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push(key, value);
        self
    }

    /// Append a set of query parameters
    #[must_use]
    pub fn query_params(mut self, params: QueryParams) -> Self {
        self.query.extend(params);
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set a JSON body (null members are stripped on send)
    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Set any body
    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set total attempts
    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// HTTP transport shared by every component
///
/// Cloning is cheap: clones share the connection pool, the token cell and
/// the cancellation token.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<HttpClientConfig>,
    base_url: Url,
    token: Arc<RwLock<Option<String>>>,
    cancel: CancellationToken,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let trimmed = config.base_url.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }
        let base_url = Url::parse(&format!("{trimmed}/"))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
            base_url,
            token: Arc::new(RwLock::new(None)),
            cancel: CancellationToken::new(),
        })
    }

    /// Use a host-supplied cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that aborts in-flight requests and waits when cancelled
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current access token, if any
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the injected access token
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::GET, path, RequestConfig::default())
            .await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query(&self, path: &str, query: QueryParams) -> Result<Response> {
        self.request(Method::GET, path, RequestConfig::new().query_params(query))
            .await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        self.request(
            Method::POST,
            path,
            RequestConfig::new().body(RequestBody::json(body)?),
        )
        .await
    }

    /// Make a request and parse the JSON response
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request(method, path, config).await?.json()
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(Method::GET, path, RequestConfig::default())
            .await
    }

    /// Make a POST request and parse the JSON response
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(path, body).await?.json()
    }

    /// Make a generic request
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let url = self.build_url(path)?;
        let policy = &self.config.retry;
        let max_attempts = policy.attempt_limit(config.max_attempts);
        let inject_token = !is_auth_path(url.path());

        let mut attempt = 0;
        loop {
            attempt += 1;
            let req = self.build_request(method, &url, &config, inject_token)?;

            let sent = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(Error::cancelled()),
                sent = req.send() => sent,
            };

            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    debug!(%method, %url, attempt, error = %e, "HTTP request failed");
                    return Err(Error::Http(e));
                }
            };

            let status = response.status().as_u16();
            if policy.should_retry(status, attempt, config.max_attempts) {
                let delay = policy.delay(attempt);
                warn!(
                    %method,
                    %url,
                    status,
                    "Request failed, attempt {}/{}, retrying in {:?}",
                    attempt,
                    max_attempts,
                    delay
                );
                self.sleep(delay).await?;
                continue;
            }

            let headers = response.headers().clone();
            let bytes = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(Error::cancelled()),
                bytes = response.bytes() => bytes?,
            };
            let body = ResponseBody::decode(bytes);

            if !is_success_status(status) {
                debug!(
                    %method,
                    %url,
                    status,
                    attempt,
                    error = %body,
                    "HTTP request returned error status"
                );
                return Err(Error::http_status(status, url.as_str(), body));
            }

            debug!(
                %method,
                %url,
                status,
                attempt,
                objects_returned = ?body.objects_returned(),
                "HTTP request succeeded"
            );
            return Ok(Response {
                status,
                url: url.to_string(),
                headers,
                body,
            });
        }
    }

    /// Sleep unless cancelled first
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::cancelled()),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    fn build_request(
        &self,
        method: Method,
        url: &Url,
        config: &RequestConfig,
        inject_token: bool,
    ) -> Result<reqwest::RequestBuilder> {
        let mut req = self.client.request(method.into(), url.clone());

        // Add default headers
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !config.body.is_multipart() {
            let content_type = match &config.body {
                RequestBody::Raw { content_type, .. } => content_type.as_str(),
                _ => JSON_CONTENT_TYPE,
            };
            req = req.header(CONTENT_TYPE, content_type);
        }

        if inject_token {
            if let Some(token) = self.token() {
                req = req.header(TOKEN_HEADER, token);
            }
        }

        // Add request-specific headers
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !config.query.is_empty() {
            req = req.query(config.query.as_pairs());
        }

        req = match &config.body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.body(serde_json::to_vec(&super::strip_nulls(
                value.clone(),
            ))?),
            RequestBody::JsonWithNulls(value) => req.body(serde_json::to_vec(value)?),
            RequestBody::Raw { bytes, .. } => req.body(bytes.clone()),
            RequestBody::Multipart(form) => req.multipart(form.to_reqwest()?),
        };

        if let Some(timeout) = config.timeout {
            req = req.timeout(timeout);
        }

        Ok(req)
    }

    /// Build full URL from a relative path or pass an absolute URL through
    pub fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .field("has_token", &self.token().is_some())
            .finish_non_exhaustive()
    }
}
