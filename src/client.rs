//! Catalog client facade
//!
//! Wires the transport, authenticator, paginator, job poller and write
//! orchestrator together for one server. Every operation other than the
//! token calls makes sure an access token is installed first.

use crate::auth::{is_auth_path, Authenticator};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig, Response, ResponseBody};
use crate::jobs::{JobHandle, JobPoller, JobRecord};
use crate::orchestrator::{AsyncOrchestrator, WriteOptions};
use crate::pagination::{decode_items, Paginator};
use crate::results::JobResult;
use crate::types::{Method, OptionStringExt};
use crate::validate::{QueryParams, Validate};
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

// ============================================================================
// Catalog API Trait
// ============================================================================

/// Operations resource-specific facades are built on
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch every page of a list endpoint
    async fn get_all(&self, path: &str, query: QueryParams) -> Result<ResponseBody>;

    /// Send one request with retries and token injection
    async fn request(&self, method: Method, path: &str, config: RequestConfig) -> Result<Response>;

    /// Write a list payload in batches, one result per batch
    async fn async_write(
        &self,
        method: Method,
        path: &str,
        items: Vec<Value>,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>>;

    /// Write a single record
    async fn async_write_dict(
        &self,
        method: Method,
        path: &str,
        body: Value,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>>;

    /// Send a raw newline-delimited JSON payload
    async fn async_write_raw(
        &self,
        method: Method,
        path: &str,
        payload: Bytes,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>>;

    /// Wait for a job to finish
    async fn poll_job(&self, handle: &JobHandle) -> Result<JobRecord>;

    /// Fetch every page and deserialize each object
    async fn get_all_typed<T>(&self, path: &str, query: QueryParams) -> Result<Vec<T>>
    where
        Self: Sized,
        T: DeserializeOwned + Send,
    {
        let body = self.get_all(path, query).await?;
        decode_items(body, path)
    }
}

// ============================================================================
// Catalog Client
// ============================================================================

/// Client for one catalog server
#[derive(Debug)]
pub struct CatalogClient {
    http: HttpClient,
    auth: Authenticator,
    poller: JobPoller,
    paginator: Paginator,
    orchestrator: AsyncOrchestrator,
}

impl CatalogClient {
    /// Build a client from validated settings
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_cancellation(config, CancellationToken::new())
    }

    /// Build a client whose requests and waits stop when `cancel` fires
    pub fn with_cancellation(config: ClientConfig, cancel: CancellationToken) -> Result<Self> {
        config.validate()?;

        let http = HttpClient::with_config(config.to_http_config())?.with_cancellation(cancel);
        if let Some(token) = config.access_token.clone().none_if_empty() {
            http.set_token(Some(token));
        }

        let auth = Authenticator::new(
            http.clone(),
            config.user_id.unwrap_or_default(),
            config.refresh_token.clone().unwrap_or_default(),
        );
        let poller = JobPoller::new(http.clone()).with_interval(config.job_poll_interval());
        let paginator = Paginator::new(http.clone()).with_page_size(config.page_size);
        let orchestrator =
            AsyncOrchestrator::new(http.clone(), poller.clone()).with_page_size(config.page_size);

        debug!(base_url = %config.base_url, page_size = config.page_size, "Catalog client ready");
        Ok(Self {
            http,
            auth,
            poller,
            paginator,
            orchestrator,
        })
    }

    /// Token operations
    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn orchestrator(&self) -> &AsyncOrchestrator {
        &self.orchestrator
    }

    /// Cancelling this token aborts the in-flight request or wait
    pub fn cancel_handle(&self) -> CancellationToken {
        self.http.cancel_handle()
    }

    /// Write typed records, each validated before anything is sent
    pub async fn async_write_typed<T: Serialize + Validate>(
        &self,
        method: Method,
        path: &str,
        items: &[T],
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        self.ensure_authenticated().await?;
        self.orchestrator
            .async_write_typed(method, path, items, options)
            .await
    }

    /// Send records as one newline-delimited JSON payload
    pub async fn async_write_ndjson<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        items: &[T],
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        self.ensure_authenticated().await?;
        self.orchestrator
            .async_write_ndjson(method, path, items, options)
            .await
    }

    async fn ensure_authenticated(&self) -> Result<()> {
        if self.http.is_cancelled() {
            return Err(Error::cancelled());
        }
        self.auth.ensure_access_token().await.map(drop)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn get_all(&self, path: &str, query: QueryParams) -> Result<ResponseBody> {
        self.ensure_authenticated().await?;
        self.paginator.get_all(path, query).await
    }

    async fn request(&self, method: Method, path: &str, config: RequestConfig) -> Result<Response> {
        if !is_auth_path(path) {
            self.ensure_authenticated().await?;
        }
        self.http.request(method, path, config).await
    }

    async fn async_write(
        &self,
        method: Method,
        path: &str,
        items: Vec<Value>,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        self.ensure_authenticated().await?;
        self.orchestrator.async_write(method, path, items, options).await
    }

    async fn async_write_dict(
        &self,
        method: Method,
        path: &str,
        body: Value,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        self.ensure_authenticated().await?;
        self.orchestrator
            .async_write_dict(method, path, body, options)
            .await
    }

    async fn async_write_raw(
        &self,
        method: Method,
        path: &str,
        payload: Bytes,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        self.ensure_authenticated().await?;
        self.orchestrator
            .async_write_raw(method, path, payload, options)
            .await
    }

    async fn poll_job(&self, handle: &JobHandle) -> Result<JobRecord> {
        self.ensure_authenticated().await?;
        self.poller.poll(handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        CREATE_ACCESS_TOKEN_PATH, VALIDATE_ACCESS_TOKEN_PATH, VALIDATE_REFRESH_TOKEN_PATH,
    };
    use crate::http::TOKEN_HEADER;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig::new(server.uri())
            .user_id(7)
            .refresh_token("refresh-abc")
            .initial_backoff(Duration::from_millis(1))
            .poll_interval(Duration::from_millis(5))
    }

    async fn mount_token_mint(server: &MockServer, token: &str) {
        Mock::given(method("POST"))
            .and(path(VALIDATE_REFRESH_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user_id": 7,
                "token_status": "ACTIVE",
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(CREATE_ACCESS_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "api_access_token": token,
                "user_id": 7,
                "token_status": "ACTIVE",
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = CatalogClient::new(ClientConfig::new("")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_get_all_mints_token_once() {
        let server = MockServer::start().await;
        mount_token_mint(&server, "minted").await;
        Mock::given(method("GET"))
            .and(path("/integration/v2/document/"))
            .and(header(TOKEN_HEADER, "minted"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(2)
            .mount(&server)
            .await;

        let client = CatalogClient::new(config_for(&server)).unwrap();
        let first = client
            .get_all("/integration/v2/document/", QueryParams::new())
            .await
            .unwrap();
        assert_eq!(first.as_array().map(Vec::len), Some(1));

        #[derive(serde::Deserialize)]
        struct Doc {
            id: i64,
        }
        let docs: Vec<Doc> = client
            .get_all_typed("/integration/v2/document/", QueryParams::new())
            .await
            .unwrap();
        assert_eq!(docs[0].id, 1);
    }

    #[tokio::test]
    async fn test_preset_access_token_is_validated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VALIDATE_ACCESS_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "api_access_token": "preset",
                "user_id": 7,
                "token_status": "ACTIVE",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/integration/v1/user/"))
            .and(header(TOKEN_HEADER, "preset"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
            .mount(&server)
            .await;

        let config = ClientConfig::new(server.uri()).user_id(7).access_token("preset");
        let client = CatalogClient::new(config).unwrap();
        let response = client
            .request(Method::GET, "/integration/v1/user/", RequestConfig::new())
            .await
            .unwrap();
        assert_eq!(response.body.as_json().unwrap()["id"], 7);
    }

    #[tokio::test]
    async fn test_request_without_credentials_fails_before_sending() {
        let server = MockServer::start().await;
        let client = CatalogClient::new(ClientConfig::new(server.uri())).unwrap();

        let err = client
            .request(Method::GET, "/integration/v1/user/", RequestConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_through_trait_object() {
        let server = MockServer::start().await;
        mount_token_mint(&server, "minted").await;
        Mock::given(method("POST"))
            .and(path("/integration/v2/folder/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": 5})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/bulk_metadata/job/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "successful",
                "msg": "done",
                "result": {"created_folder_count": 1, "created_folders": [{"id": 3, "title": "f"}]},
            })))
            .mount(&server)
            .await;

        let api: Arc<dyn CatalogApi> = Arc::new(CatalogClient::new(config_for(&server)).unwrap());
        let results = api
            .async_write(
                Method::POST,
                "/integration/v2/folder/",
                vec![json!({"title": "f"})],
                WriteOptions::new().endpoint(crate::results::Endpoint::FolderPost),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_success());
        assert_eq!(crate::results::created_objects(&results)[0].id, 3);
    }

    #[tokio::test]
    async fn test_cancelled_client_sends_nothing() {
        let server = MockServer::start().await;
        let client = CatalogClient::new(config_for(&server)).unwrap();
        client.cancel_handle().cancel();

        let err = client.poll_job(&JobHandle::Id(1)).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
