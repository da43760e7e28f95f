//! Pre-flight validation module
//!
//! Runs before the transport is touched:
//!
//! - **ParamsShape**: query parameters are absent or a known record
//!   (`UnsupportedQueryParams`)
//! - **PayloadShape**: each list element is one of the expected records
//!   (`UnsupportedPostBody`)
//! - **FieldShape**: required fields, enumerations, conditional fields
//!   (`InvalidPostBody`)

mod params;
mod schema;

pub use params::{validate_params, ListStyle, QueryParams};
pub use schema::{validate_payload, Case, FieldKind, FieldRule, RecordSchema, Validate};

#[cfg(test)]
mod tests;
