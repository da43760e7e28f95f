//! Pagination types

use crate::http::ResponseBody;
use crate::validate::QueryParams;

/// Default number of objects requested per page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// One page of a paginated GET
#[derive(Debug, Clone, PartialEq)]
pub struct PageWindow {
    /// Zero-based position of the page
    pub index: usize,
    /// Path (with query) this page was fetched from
    pub path: String,
    /// Decoded page body
    pub body: ResponseBody,
    /// Relative path of the following page, from `X-Next-Page`
    pub next: Option<String>,
}

impl PageWindow {
    /// Objects on this page, if the body is a list
    pub fn len(&self) -> Option<usize> {
        self.body.objects_returned()
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none() || !self.body.is_list()
    }
}

/// Request for the next page to fetch
#[derive(Debug, Clone)]
pub(crate) struct PageRequest {
    pub path: String,
    pub query: QueryParams,
}
