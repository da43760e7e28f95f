//! Async job module
//!
//! Many catalog writes are executed as server-side jobs. The write response
//! carries a `JobHandle` (an integer id or a string name, possibly nested
//! under `task` or `job`); the `JobPoller` waits on the job status endpoint
//! until the job reaches `successful` or `failed`.

mod poller;
mod types;

pub use poller::{JobPoller, DEFAULT_POLL_INTERVAL, JOB_STATUS_PATH};
pub use types::{JobHandle, JobRecord, JobStatus, JOB_BODY_KEYS};
