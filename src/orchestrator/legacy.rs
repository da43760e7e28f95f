//! Secondary job ids embedded in PUT results
//!
//! Some PUT endpoints finish by enqueueing a second job and report it as a
//! trailing `(can be tracked using jobs API): <id>` in a result line.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static LEGACY_JOB_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(can be tracked using jobs API\): (\d+)$").unwrap());

/// Job ids referenced by a job result, in order
pub fn legacy_job_ids(result: &Value) -> Vec<i64> {
    match result {
        Value::String(line) => job_id_in(line).into_iter().collect(),
        Value::Array(lines) => lines
            .iter()
            .filter_map(Value::as_str)
            .filter_map(job_id_in)
            .collect(),
        _ => Vec::new(),
    }
}

fn job_id_in(line: &str) -> Option<i64> {
    LEGACY_JOB_REGEX
        .captures(line.trim_end())
        .and_then(|caps| caps.get(1))
        .and_then(|id| id.as_str().parse().ok())
}
