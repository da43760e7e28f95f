//! HTTP transport module
//!
//! Wraps a reqwest session with the catalog's conventions.
//!
//! # Features
//!
//! - **Automatic Retries**: 429/500/502/503/504 only, exponential backoff
//! - **Token Injection**: `Token` header on every non-authentication call
//! - **Body Decoding**: JSON, then UTF-8 text, then raw bytes
//! - **Cancellation**: one `CancellationToken` per client aborts sends and waits

mod body;
mod client;
mod retry;

pub use body::{
    encode_ndjson, is_success_status, strip_nulls, MultipartForm, RequestBody, Response,
    ResponseBody, JSON_CONTENT_TYPE, NEXT_PAGE_HEADER,
};
pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig, TOKEN_HEADER,
};
pub use retry::RetryPolicy;

#[cfg(test)]
mod tests;
