//! Options for a batched write

use crate::results::Endpoint;
use crate::validate::{QueryParams, RecordSchema};

/// Per-call settings of an async write
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Objects per request; capped at the client's page size
    pub batch_size: Option<usize>,
    /// Query parameters sent with every batch
    pub query: QueryParams,
    /// Discriminator selecting the result shape
    pub endpoint: Endpoint,
    /// Accepted record shapes; empty means "any record"
    pub schemas: Vec<RecordSchema>,
    /// Send `null` members instead of stripping them
    pub keep_nulls: bool,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Accept records matching `schema` (may be called more than once)
    #[must_use]
    pub fn schema(mut self, schema: RecordSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    #[must_use]
    pub fn keep_nulls(mut self) -> Self {
        self.keep_nulls = true;
        self
    }

    /// Effective batch size for a client with `page_size`
    pub fn effective_batch_size(&self, page_size: usize) -> usize {
        self.batch_size
            .map_or(page_size, |size| size.min(page_size))
            .max(1)
    }
}
