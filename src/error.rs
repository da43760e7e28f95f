//! Error types for the catalog client
//!
//! Every public API returns `Result<T, Error>`. The variants follow the
//! failure classes a caller has to tell apart: pre-flight validation,
//! HTTP status failures, transport failures and cancellation.

use crate::http::ResponseBody;
use crate::results::JobResult;
use thiserror::Error;

/// The main error type for the catalog client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Validation Errors (raised before any request is sent)
    // ============================================================================
    #[error("Unsupported query parameters: {message}")]
    UnsupportedQueryParams { message: String },

    #[error("Unsupported request body: {message}")]
    UnsupportedPostBody { message: String },

    #[error("Invalid request body: {message}")]
    InvalidPostBody { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: ResponseBody,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Operation cancelled ({} results completed)", completed.len())]
    Cancelled { completed: Vec<JobResult> },

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("No usable credential: {message}")]
    Unauthenticated { message: String },

    #[error("Invalid timestamp '{value}': {message}")]
    Timestamp { value: String, message: String },

    // ============================================================================
    // Job Errors
    // ============================================================================
    #[error("Could not extract a job handle from response: {body}")]
    JobHandle { body: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unsupported query parameters error
    pub fn unsupported_params(message: impl Into<String>) -> Self {
        Self::UnsupportedQueryParams {
            message: message.into(),
        }
    }

    /// Create an unsupported body error
    pub fn unsupported_body(message: impl Into<String>) -> Self {
        Self::UnsupportedPostBody {
            message: message.into(),
        }
    }

    /// Create an invalid body error
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::InvalidPostBody {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, url: impl Into<String>, body: ResponseBody) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            body,
        }
    }

    /// Create an unauthenticated error
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Cancellation with no accumulated results
    pub fn cancelled() -> Self {
        Self::Cancelled {
            completed: Vec::new(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this error is a pre-flight validation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedQueryParams { .. }
                | Error::UnsupportedPostBody { .. }
                | Error::InvalidPostBody { .. }
        )
    }

    /// Check if this error aborts a batched write instead of being
    /// recorded against the batch that raised it
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::HttpStatus { .. }
                | Error::Cancelled { .. }
                | Error::Unauthenticated { .. }
        ) || self.is_validation()
    }

    /// Short machine-readable name for the error class
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnsupportedQueryParams { .. } => "unsupported_query_params",
            Error::UnsupportedPostBody { .. } => "unsupported_post_body",
            Error::InvalidPostBody { .. } => "invalid_post_body",
            Error::Http(_) => "http",
            Error::HttpStatus { .. } => "http_status",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Cancelled { .. } => "cancelled",
            Error::Unauthenticated { .. } => "unauthenticated",
            Error::Timestamp { .. } => "timestamp",
            Error::JobHandle { .. } => "job_handle",
            Error::Config { .. } => "config",
            Error::JsonParse(_) => "json_parse",
            Error::YamlParse(_) => "yaml_parse",
            Error::Io(_) => "io",
            Error::Other(_) => "other",
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the catalog client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
