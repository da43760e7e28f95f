//! Job handle and job record types

use crate::error::{Error, Result};
use crate::validate::QueryParams;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Keys whose presence marks a response body as an async job reference
pub const JOB_BODY_KEYS: [&str; 4] = ["task", "job", "job_id", "job_name"];

/// Server-side job state
///
/// Parsed case-insensitively. Any value other than `successful` and
/// `failed` is non-terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Successful,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "successful" => Self::Successful,
            "failed" => Self::Failed,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Terminal states end the polling loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Successful | Self::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.map(|s| Self::parse(&s)).unwrap_or_default())
    }
}

/// Job record returned by the job status endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
    /// null, a string, a list of strings or a mapping
    #[serde(default)]
    pub result: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference to a server-side job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobHandle {
    Id(i64),
    Name(String),
}

impl JobHandle {
    /// Check whether a response body references an async job
    pub fn is_job_body(body: &Value) -> bool {
        body.as_object()
            .is_some_and(|map| JOB_BODY_KEYS.iter().any(|k| map.contains_key(*k)))
    }

    /// Extract a handle from any of the shapes the server returns
    ///
    /// Accepts `{job_id}`, `{job_name}`, `{task: {id | name}}`,
    /// `{job: {id | name}}` and their scalar forms (`{task: 12}`).
    /// Numeric strings are read as ids. An id wins over a name.
    pub fn from_body(body: &Value) -> Result<Self> {
        let not_found = || Error::JobHandle {
            body: body.to_string(),
        };
        let map = body.as_object().ok_or_else(not_found)?;

        if let Some(handle) = from_fields(map, "job_id", "job_name") {
            return Ok(handle);
        }
        for key in ["task", "job"] {
            match map.get(key) {
                Some(Value::Object(nested)) => {
                    if let Some(handle) = from_fields(nested, "id", "name")
                        .or_else(|| from_fields(nested, "job_id", "job_name"))
                    {
                        return Ok(handle);
                    }
                }
                Some(scalar) => {
                    if let Some(handle) = id_from(scalar).or_else(|| name_from(scalar)) {
                        return Ok(handle);
                    }
                }
                None => {}
            }
        }
        Err(not_found())
    }

    /// Query selecting this job on the status endpoint
    pub fn query(&self) -> QueryParams {
        match self {
            Self::Id(id) => QueryParams::new().with("id", id.to_string()),
            Self::Name(name) => QueryParams::new().with("name", name.clone()),
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "job #{id}"),
            Self::Name(name) => write!(f, "job '{name}'"),
        }
    }
}

fn from_fields(map: &Map<String, Value>, id_key: &str, name_key: &str) -> Option<JobHandle> {
    map.get(id_key)
        .and_then(id_from)
        .or_else(|| map.get(name_key).and_then(name_from))
}

fn id_from(value: &Value) -> Option<JobHandle> {
    match value {
        Value::Number(n) => n.as_i64().map(JobHandle::Id),
        Value::String(s) => s.trim().parse().ok().map(JobHandle::Id),
        _ => None,
    }
}

fn name_from(value: &Value) -> Option<JobHandle> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| JobHandle::Name(s.to_string()))
}
