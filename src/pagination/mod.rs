//! Pagination module
//!
//! List endpoints return at most `limit` objects per response and point at
//! the next page with an `X-Next-Page` header holding a relative path. The
//! `Paginator` follows that header until it is absent and concatenates the
//! pages in order.

mod paginator;
mod types;

pub use paginator::{decode_items, Pages, Paginator};
pub use types::{PageWindow, DEFAULT_PAGE_SIZE};
