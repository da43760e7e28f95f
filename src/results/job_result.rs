//! The per-batch result of a write

use super::normalize::{Endpoint, NormalizedResult};
use super::shapes::ObjectRef;
use crate::error::{Error, Result};
use crate::jobs::{JobRecord, JobStatus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Outcome of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResultStatus {
    Successful,
    PartiallySuccessful,
    Failed,
}

impl fmt::Display for JobResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Successful => "successful",
            Self::PartiallySuccessful => "partially_successful",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Normalized result of one batch of a write
///
/// `T` is the result payload; by default the endpoint-keyed
/// [`NormalizedResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult<T = NormalizedResult> {
    pub status: JobResultStatus,
    pub msg: String,
    pub result: T,
}

impl JobResult<NormalizedResult> {
    /// A successful result carrying a raw server value
    pub fn successful(value: Value) -> Self {
        Self {
            status: JobResultStatus::Successful,
            msg: String::new(),
            result: NormalizedResult::Passthrough(value),
        }
    }

    /// Normalize a terminal job record
    ///
    /// A successful job whose result reports per-object failures becomes
    /// `PartiallySuccessful`. Failed jobs keep their raw result.
    pub fn from_record(record: JobRecord, endpoint: Endpoint) -> Self {
        if record.status != JobStatus::Successful {
            return Self {
                status: JobResultStatus::Failed,
                msg: record.msg,
                result: NormalizedResult::Passthrough(record.result),
            };
        }
        let result = NormalizedResult::normalize(endpoint, record.result);
        Self {
            status: success_status(&result),
            msg: record.msg,
            result,
        }
    }

    /// Normalize a synchronous response body
    pub fn from_body(body: Value, endpoint: Endpoint) -> Self {
        let result = NormalizedResult::normalize(endpoint, body);
        Self {
            status: success_status(&result),
            msg: String::new(),
            result,
        }
    }

    /// A failed result describing an error raised while handling a batch
    pub fn failed_from_error(err: &Error) -> Self {
        Self {
            status: JobResultStatus::Failed,
            msg: String::new(),
            result: NormalizedResult::Passthrough(json!({
                "error": err.kind(),
                "message": err.to_string(),
            })),
        }
    }

    /// Re-read the result as a caller-defined shape
    pub fn typed<U: DeserializeOwned>(&self) -> Result<JobResult<U>> {
        Ok(JobResult {
            status: self.status,
            msg: self.msg.clone(),
            result: self.result.parse()?,
        })
    }
}

impl<T> JobResult<T> {
    pub fn is_success(&self) -> bool {
        self.status == JobResultStatus::Successful
    }

    pub fn is_failed(&self) -> bool {
        self.status == JobResultStatus::Failed
    }

    /// Transform the result payload
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> JobResult<U> {
        JobResult {
            status: self.status,
            msg: self.msg,
            result: f(self.result),
        }
    }
}

fn success_status(result: &NormalizedResult) -> JobResultStatus {
    if result.has_item_errors() {
        JobResultStatus::PartiallySuccessful
    } else {
        JobResultStatus::Successful
    }
}

/// Created objects of every batch, in batch order
pub fn created_objects(results: &[JobResult]) -> Vec<ObjectRef> {
    results
        .iter()
        .filter_map(|r| match &r.result {
            NormalizedResult::Created(created) => Some(created.created_objects.iter().cloned()),
            _ => None,
        })
        .flatten()
        .collect()
}
