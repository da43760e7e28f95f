//! Continuation-header pagination
//!
//! The first GET carries `limit`; every later page is fetched from the
//! relative path the server sends in `X-Next-Page`, as is.

use super::types::{PageRequest, PageWindow, DEFAULT_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::http::{HttpClient, ResponseBody};
use crate::validate::QueryParams;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Drives paginated GETs over a shared transport
#[derive(Debug, Clone)]
pub struct Paginator {
    client: HttpClient,
    page_size: usize,
}

impl Paginator {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Iterate pages one at a time
    ///
    /// `limit` is appended unless the caller already set it.
    pub fn pages(&self, path: &str, mut query: QueryParams) -> Pages<'_> {
        if !query.contains("limit") {
            query.push("limit", self.page_size.to_string());
        }
        Pages {
            client: &self.client,
            pending: Some(PageRequest {
                path: path.to_string(),
                query,
            }),
            fetched: 0,
        }
    }

    /// Fetch every page and concatenate the list bodies in server order
    ///
    /// A first page that is not a list (text, bytes or a JSON record) is
    /// returned as is. Any failure discards the pages fetched so far.
    pub async fn get_all(&self, path: &str, query: QueryParams) -> Result<ResponseBody> {
        let mut pages = self.pages(path, query);
        let Some(first) = pages.next().await? else {
            return Ok(ResponseBody::Json(Value::Array(Vec::new())));
        };

        let mut items = match first.body {
            ResponseBody::Json(Value::Array(items)) => items,
            other => return Ok(other),
        };

        while let Some(page) = pages.next().await? {
            match page.body {
                ResponseBody::Json(Value::Array(rows)) => items.extend(rows),
                other => {
                    return Err(Error::Other(format!(
                        "page {} of {path} is not a list: {other}",
                        page.index
                    )))
                }
            }
        }

        debug!(path, pages = pages.fetched(), objects = items.len(), "Fetched all pages");
        Ok(ResponseBody::Json(Value::Array(items)))
    }

    /// Fetch every page and deserialize each object
    pub async fn get_all_typed<T: DeserializeOwned>(
        &self,
        path: &str,
        query: QueryParams,
    ) -> Result<Vec<T>> {
        decode_items(self.get_all(path, query).await?, path)
    }
}

/// Deserialize each object of a fetched body
///
/// A single JSON record decodes as a one-element list.
pub fn decode_items<T: DeserializeOwned>(body: ResponseBody, path: &str) -> Result<Vec<T>> {
    match body {
        ResponseBody::Json(Value::Array(items)) => items
            .into_iter()
            .map(|item| Ok(serde_json::from_value(item)?))
            .collect(),
        ResponseBody::Json(other) => Ok(vec![serde_json::from_value(other)?]),
        other => Err(Error::Other(format!(
            "expected a JSON list from {path}, got: {other}"
        ))),
    }
}

/// Lazy page iterator returned by [`Paginator::pages`]
#[derive(Debug)]
pub struct Pages<'a> {
    client: &'a HttpClient,
    pending: Option<PageRequest>,
    fetched: usize,
}

impl Pages<'_> {
    /// Fetch the next page, or `None` once the server stops sending
    /// `X-Next-Page`
    pub async fn next(&mut self) -> Result<Option<PageWindow>> {
        let Some(request) = self.pending.take() else {
            return Ok(None);
        };

        let response = self
            .client
            .get_with_query(&request.path, request.query)
            .await?;
        let next = response.next_page().map(str::to_string);

        let window = PageWindow {
            index: self.fetched,
            path: request.path,
            body: response.body,
            next,
        };
        self.fetched += 1;

        if window.body.is_list() {
            self.pending = window.next.clone().map(|path| PageRequest {
                path,
                query: QueryParams::new(),
            });
        }
        Ok(Some(window))
    }

    /// Pages fetched so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }
}
