//! Job status polling

use super::types::{JobHandle, JobRecord};
use crate::error::Result;
use crate::http::HttpClient;
use std::time::Duration;
use tracing::{debug, info};

/// Job status endpoint
pub const JOB_STATUS_PATH: &str = "/api/v1/bulk_metadata/job/";

/// Wait between two status requests
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Polls the job status endpoint until a job is terminal
///
/// There is no timeout: a job that never finishes is polled until the
/// transport's cancellation token fires.
#[derive(Debug, Clone)]
pub struct JobPoller {
    client: HttpClient,
    interval: Duration,
}

impl JobPoller {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the wait between status requests
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until the job reports `successful` or `failed`
    pub async fn poll(&self, handle: &JobHandle) -> Result<JobRecord> {
        let mut polls: u32 = 0;
        loop {
            polls += 1;
            let record: JobRecord = self
                .client
                .get_with_query(JOB_STATUS_PATH, handle.query())
                .await?
                .json()?;

            if record.status.is_terminal() {
                info!(%handle, status = %record.status, polls, "Job finished");
                return Ok(record);
            }

            debug!(%handle, status = %record.status, polls, "Job still running");
            self.client.sleep(self.interval).await?;
        }
    }
}
