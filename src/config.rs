//! Client configuration
//!
//! Everything needed to reach one catalog server: its URL, the credentials,
//! transport tuning and the job polling cadence. Loadable from YAML and
//! overridable from `CATALOG_*` environment variables.

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RetryPolicy};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::types::{BackoffType, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server root, trailing `/` ignored
    #[serde(default)]
    pub base_url: String,

    /// Numeric user id sent in token bodies
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Long-lived credential used to mint access tokens
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Pre-issued access token, validated before first use
    #[serde(default)]
    pub access_token: Option<String>,

    /// Pagination `limit` and the largest batch a write sends
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Transport settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Job polling settings
    #[serde(default)]
    pub jobs: JobSettings,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_id: None,
            refresh_token: None,
            access_token: None,
            page_size: default_page_size(),
            http: HttpSettings::default(),
            jobs: JobSettings::default(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("access_token", &redact(&self.access_token))
            .field("page_size", &self.page_size)
            .field("http", &self.http)
            .field("jobs", &self.jobs)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config for `base_url` with every other setting defaulted
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.http.max_attempts = attempts;
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.http.initial_backoff_ms = duration_ms(backoff);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.jobs.poll_interval_ms = duration_ms(interval);
        self
    }

    /// Apply `CATALOG_*` environment variables on top of the loaded values
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("CATALOG_BASE_URL") {
            self.base_url = url;
        }
        if let Some(user_id) = lookup("CATALOG_USER_ID") {
            let parsed = user_id
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("CATALOG_USER_ID is not a number: {user_id}")))?;
            self.user_id = Some(parsed);
        }
        if let Some(token) = lookup("CATALOG_REFRESH_TOKEN") {
            self.refresh_token = Some(token);
        }
        if let Some(token) = lookup("CATALOG_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(size) = lookup("CATALOG_PAGE_SIZE") {
            self.page_size = size
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("CATALOG_PAGE_SIZE is not a number: {size}")))?;
        }
        Ok(self)
    }

    /// Check the settings that would otherwise fail later at request time
    pub fn validate(&self) -> Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }
        url::Url::parse(trimmed)?;
        if self.page_size == 0 {
            return Err(Error::config("page_size must be at least 1"));
        }
        if self.http.max_attempts == 0 {
            return Err(Error::config("http.max_attempts must be at least 1"));
        }
        if self.refresh_token.clone().none_if_empty().is_some() && self.user_id.is_none() {
            return Err(Error::config("user_id is required with a refresh_token"));
        }
        Ok(())
    }

    /// Transport configuration derived from these settings
    pub fn to_http_config(&self) -> HttpClientConfig {
        let retry = RetryPolicy {
            max_attempts: self.http.max_attempts,
            initial_backoff: Duration::from_millis(self.http.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.http.max_backoff_ms),
            backoff_type: BackoffType::Exponential,
            jitter: self.http.jitter,
        };

        HttpClientConfig::builder()
            .base_url(self.base_url.trim())
            .connect_timeout(Duration::from_secs(self.http.connect_timeout_secs))
            .timeout(Duration::from_secs(self.http.read_timeout_secs))
            .retry(retry)
            .user_agent(&self.http.user_agent)
            .build()
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_millis(self.jobs.poll_interval_ms)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// Transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Total attempts for retryable statuses
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound for a single retry delay in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Add up to 50% random jitter to retry delays
    #[serde(default)]
    pub jitter: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff() -> u64 {
    200
}

fn default_max_backoff() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    format!("catalog-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            jitter: false,
            user_agent: default_user_agent(),
        }
    }
}

// ============================================================================
// Job Settings
// ============================================================================

/// Job polling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    /// Sleep between status polls in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    3_000
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}
