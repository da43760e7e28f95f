//! Async write orchestration
//!
//! Control flow of a write:
//!
//! ```text
//! payload → validate → batches → request → job handle? → poll → normalize
//!                                            └── no ──────────→ normalize
//! ```
//!
//! A PUT whose job result ends with `(can be tracked using jobs API): <id>`
//! is followed by a poll of that secondary job, which adds one more result.

mod legacy;
mod options;
mod writer;

pub use legacy::legacy_job_ids;
pub use options::WriteOptions;
pub use writer::{batches, AsyncOrchestrator};
