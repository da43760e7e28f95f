// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Catalog Client
//!
//! Typed client core for a data catalog HTTP API. Resource-specific
//! facades (documents, folders, terms, data sources...) are thin layers
//! over what this crate provides.
//!
//! ## Features
//!
//! - **Token Lifecycle**: refresh token → access token, injected into every call
//! - **Retries**: throttling and gateway errors retried with exponential backoff
//! - **Paged Reads**: follows `X-Next-Page` and concatenates list bodies
//! - **Async Jobs**: batches writes, polls the jobs they start, follows
//!   secondary jobs reported by legacy endpoints
//! - **Typed Results**: every write yields one [`JobResult`] per batch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_client::{CatalogApi, CatalogClient, ClientConfig, Endpoint, Method, WriteOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> catalog_client::Result<()> {
//!     let config = ClientConfig::from_file("catalog.yaml")?.with_env_overrides()?;
//!     let client = CatalogClient::new(config)?;
//!
//!     let results = client
//!         .async_write(
//!             Method::POST,
//!             "/integration/v2/document/",
//!             vec![json!({"title": "Runbook", "folder": 3})],
//!             WriteOptions::new().endpoint(Endpoint::DocumentPost),
//!         )
//!         .await?;
//!
//!     for object in catalog_client::results::created_objects(&results) {
//!         println!("{} {:?}", object.id, object.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 CatalogClient / CatalogApi                   │
//! └──────────────────────────────────────────────────────────────┘
//!          │               │                  │
//! ┌────────┴──────┬────────┴───────┬──────────┴──────────────────┐
//! │ Authenticator │   Paginator    │       AsyncOrchestrator     │
//! │ refresh token │ X-Next-Page    │ validate → batch → submit   │
//! │ access token  │ limit          │ → poll job → normalize      │
//! └───────────────┴────────────────┴─────────────────────────────┘
//!          │               │                  │
//! ┌────────┴───────────────┴──────────────────┴──────────────────┐
//! │              HttpClient (retry, token, cancel)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// HTTP transport with retry and token injection
pub mod http;

/// Query and payload validation
pub mod validate;

/// Refresh and access token lifecycle
pub mod auth;

/// Paged list reads
pub mod pagination;

/// Async job handles and polling
pub mod jobs;

/// Typed job results
pub mod results;

/// Batched writes backed by async jobs
pub mod orchestrator;

/// Client facade
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use client::{CatalogApi, CatalogClient};
pub use config::ClientConfig;
pub use orchestrator::WriteOptions;
pub use results::{Endpoint, JobResult, JobResultStatus, NormalizedResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
