//! Batched async writes

use super::legacy::legacy_job_ids;
use super::options::WriteOptions;
use crate::error::{Error, Result};
use crate::http::{encode_ndjson, HttpClient, RequestBody, RequestConfig, ResponseBody};
use crate::jobs::{JobHandle, JobPoller};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::results::{Endpoint, JobResult};
use crate::types::Method;
use crate::validate::{validate_payload, Validate};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Submits writes, waits for the jobs they start and normalizes results
///
/// Batches are submitted strictly in order: batch N+1 is not sent until
/// batch N's response, and its job if any, has finished.
#[derive(Debug, Clone)]
pub struct AsyncOrchestrator {
    client: HttpClient,
    poller: JobPoller,
    page_size: usize,
}

impl AsyncOrchestrator {
    pub fn new(client: HttpClient, poller: JobPoller) -> Self {
        Self {
            client,
            poller,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Upper bound on the batch size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Cancelling this token aborts the in-flight request or poll wait
    pub fn cancel_handle(&self) -> CancellationToken {
        self.client.cancel_handle()
    }

    /// Write a list payload in batches
    ///
    /// Returns one result per batch, plus one per secondary job a PUT
    /// reports. HTTP errors abort the whole call; any other error raised
    /// while handling a batch is recorded as a failed result for that
    /// batch. On cancellation the results gathered so far travel in
    /// [`Error::Cancelled`].
    pub async fn async_write(
        &self,
        method: Method,
        path: &str,
        mut items: Vec<Value>,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        ensure_write(method)?;
        validate_payload(&mut items, &options.schemas)?;

        let batch_size = options.effective_batch_size(self.page_size);
        let total = items.len().div_ceil(batch_size);
        let mut results = Vec::with_capacity(total);

        for (index, batch) in batches(&items, batch_size).enumerate() {
            debug!(
                %method,
                path,
                batch = index + 1,
                batches = total,
                items = batch.len(),
                "Submitting batch"
            );
            let body = if options.keep_nulls {
                RequestBody::JsonWithNulls(Value::Array(batch.to_vec()))
            } else {
                RequestBody::Json(Value::Array(batch.to_vec()))
            };
            let config = RequestConfig::new()
                .query_params(options.query.clone())
                .body(body);

            match self.submit(method, path, config, options.endpoint).await {
                Ok(batch_results) => results.extend(batch_results),
                Err(Error::Cancelled { completed }) => {
                    results.extend(completed);
                    return Err(Error::Cancelled { completed: results });
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(%method, path, batch = index + 1, error = %e, "Batch failed");
                    results.push(JobResult::failed_from_error(&e));
                }
            }
        }

        info!(%method, path, batches = total, results = results.len(), "Async write finished");
        Ok(results)
    }

    /// Write typed records, validating each before anything is sent
    pub async fn async_write_typed<T: Serialize + Validate>(
        &self,
        method: Method,
        path: &str,
        items: &[T],
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        let mut values = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            item.validate().map_err(|e| match e {
                Error::InvalidPostBody { message } => {
                    Error::invalid_body(format!("item {index}: {message}"))
                }
                Error::UnsupportedPostBody { message } => {
                    Error::unsupported_body(format!("item {index}: {message}"))
                }
                other => other,
            })?;
            values.push(serde_json::to_value(item)?);
        }
        self.async_write(method, path, values, options).await
    }

    /// Write a single record without batching
    ///
    /// Errors propagate; nothing is trapped into a failed result.
    pub async fn async_write_dict(
        &self,
        method: Method,
        path: &str,
        body: Value,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        ensure_write(method)?;
        let mut items = [body];
        validate_payload(&mut items, &options.schemas)?;
        let [body] = items;

        let body = if options.keep_nulls {
            RequestBody::JsonWithNulls(body)
        } else {
            RequestBody::Json(body)
        };
        let config = RequestConfig::new().query_params(options.query).body(body);
        self.submit(method, path, config, options.endpoint).await
    }

    /// Send a raw payload (newline-delimited JSON) as one request
    pub async fn async_write_raw(
        &self,
        method: Method,
        path: &str,
        payload: Bytes,
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        ensure_write(method)?;
        if payload.is_empty() {
            return Err(Error::unsupported_body("raw payload is empty"));
        }
        let config = RequestConfig::new()
            .query_params(options.query)
            .body(RequestBody::raw(payload));
        self.submit(method, path, config, options.endpoint).await
    }

    /// Serialize records as newline-delimited JSON and send them in one
    /// request
    pub async fn async_write_ndjson<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        items: &[T],
        options: WriteOptions,
    ) -> Result<Vec<JobResult>> {
        let payload = encode_ndjson(items)?;
        self.async_write_raw(method, path, payload, options).await
    }

    /// Send one request and turn its response into results
    async fn submit(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
        endpoint: Endpoint,
    ) -> Result<Vec<JobResult>> {
        let response = self.client.request(method, path, config).await?;
        self.collect(method, response.body, endpoint).await
    }

    async fn collect(
        &self,
        method: Method,
        body: ResponseBody,
        endpoint: Endpoint,
    ) -> Result<Vec<JobResult>> {
        let body = body.into_json();
        if !JobHandle::is_job_body(&body) {
            return Ok(vec![JobResult::from_body(body, endpoint)]);
        }

        let handle = JobHandle::from_body(&body)?;
        debug!(%handle, "Waiting for job");
        let record = self.poller.poll(&handle).await?;

        let secondary = if method == Method::PUT {
            legacy_job_ids(&record.result)
        } else {
            Vec::new()
        };
        let mut results = vec![JobResult::from_record(record, endpoint)];

        for id in secondary {
            let handle = JobHandle::Id(id);
            debug!(%handle, "Waiting for secondary job");
            match self.poller.poll(&handle).await {
                Ok(record) => results.push(JobResult::from_record(record, Endpoint::Generic)),
                Err(Error::Cancelled { .. }) => return Err(Error::Cancelled { completed: results }),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(%handle, error = %e, "Secondary job could not be read");
                    results.push(JobResult::failed_from_error(&e));
                }
            }
        }
        Ok(results)
    }
}

/// Contiguous batches of at most `size` items
pub fn batches<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

fn ensure_write(method: Method) -> Result<()> {
    if method.is_write() {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{method} requests do not carry a payload"
        )))
    }
}
