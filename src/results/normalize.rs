//! Result normalization
//!
//! Dispatch table from an endpoint discriminator to the parser for that
//! endpoint's job result. A result that does not fit its shape is kept
//! verbatim as `Passthrough`.

use super::shapes::{
    CreatedObjects, CustomFieldIds, CustomFieldOutcome, DataQualitySummary, DataflowOutcome,
    DeletedObjects, RelationalOutcome, UpdatedObjects, VirtualDatasourceSummary,
};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Endpoint discriminator chosen by the caller of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endpoint {
    /// Keep the raw server value
    #[default]
    Generic,
    DocumentPost,
    DocumentPut,
    DocumentDelete,
    FolderPost,
    FolderPut,
    FolderDelete,
    TermPost,
    TermDelete,
    CustomFieldPost,
    RdbmsPost,
    VirtualDatasourcePost,
    DataQuality,
    DataflowPost,
    DataflowPatch,
    DataflowDelete,
    PolicyPost,
    PolicyPut,
}

const ENDPOINT_NAMES: &[(Endpoint, &str)] = &[
    (Endpoint::Generic, "generic"),
    (Endpoint::DocumentPost, "document-post"),
    (Endpoint::DocumentPut, "document-put"),
    (Endpoint::DocumentDelete, "document-delete"),
    (Endpoint::FolderPost, "folder-post"),
    (Endpoint::FolderPut, "folder-put"),
    (Endpoint::FolderDelete, "folder-delete"),
    (Endpoint::TermPost, "term-post"),
    (Endpoint::TermDelete, "term-delete"),
    (Endpoint::CustomFieldPost, "custom-field-post"),
    (Endpoint::RdbmsPost, "rdbms-post"),
    (Endpoint::VirtualDatasourcePost, "virtual-datasource-post"),
    (Endpoint::DataQuality, "data-quality"),
    (Endpoint::DataflowPost, "dataflow-post"),
    (Endpoint::DataflowPatch, "dataflow-patch"),
    (Endpoint::DataflowDelete, "dataflow-delete"),
    (Endpoint::PolicyPost, "policy-post"),
    (Endpoint::PolicyPut, "policy-put"),
];

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        ENDPOINT_NAMES
            .iter()
            .find(|(e, _)| *e == self)
            .map_or("generic", |(_, name)| name)
    }

    /// All known discriminators
    pub fn all() -> impl Iterator<Item = Endpoint> {
        ENDPOINT_NAMES.iter().map(|(e, _)| *e)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ENDPOINT_NAMES
            .iter()
            .find(|(_, name)| *name == wanted)
            .map(|(e, _)| *e)
            .ok_or_else(|| Error::Other(format!("unknown endpoint discriminator '{s}'")))
    }
}

/// Typed job result, one variant per result shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedResult {
    Passthrough(Value),
    Created(CreatedObjects),
    Updated(UpdatedObjects),
    Deleted(DeletedObjects),
    CustomFields(Vec<CustomFieldOutcome>),
    RelationalUpsert(Vec<RelationalOutcome>),
    VirtualDatasource(VirtualDatasourceSummary),
    DataQuality(DataQualitySummary),
    DataflowUpsert(Vec<DataflowOutcome>),
    DataflowDelete(Vec<DataflowOutcome>),
    /// Progress lines, kept verbatim
    Progress(Vec<String>),
}

impl Default for NormalizedResult {
    fn default() -> Self {
        Self::Passthrough(Value::Null)
    }
}

impl NormalizedResult {
    /// Parse a raw job result into the shape `endpoint` produces
    pub fn normalize(endpoint: Endpoint, raw: Value) -> Self {
        if raw.is_null() {
            return Self::Passthrough(raw);
        }
        match Self::try_normalize(endpoint, raw.clone()) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    %endpoint,
                    error = %e,
                    "Job result does not match its expected shape, keeping it as is"
                );
                Self::Passthrough(raw)
            }
        }
    }

    fn try_normalize(endpoint: Endpoint, raw: Value) -> Result<Self> {
        Ok(match endpoint {
            Endpoint::Generic => Self::Passthrough(raw),
            Endpoint::DocumentPost | Endpoint::FolderPost | Endpoint::TermPost => {
                let mut created: CreatedObjects = parse_record(raw)?;
                if created.created_count == 0 {
                    created.created_count = created.created_objects.len() as u64;
                }
                Self::Created(created)
            }
            Endpoint::DocumentPut | Endpoint::FolderPut => {
                let mut updated: UpdatedObjects = parse_record(raw)?;
                if updated.updated_count == 0 {
                    updated.updated_count = updated.updated_objects.len() as u64;
                }
                Self::Updated(updated)
            }
            Endpoint::DocumentDelete | Endpoint::FolderDelete | Endpoint::TermDelete => {
                let mut deleted: DeletedObjects = parse_record(raw)?;
                if deleted.deleted_count == 0 {
                    deleted.deleted_count = deleted.deleted_ids.len() as u64;
                }
                Self::Deleted(deleted)
            }
            Endpoint::CustomFieldPost => Self::CustomFields(
                as_list(raw)
                    .into_iter()
                    .map(custom_field_outcome)
                    .collect::<Result<_>>()?,
            ),
            Endpoint::RdbmsPost => Self::RelationalUpsert(parse_list(raw)?),
            Endpoint::VirtualDatasourcePost => Self::VirtualDatasource(parse_record(raw)?),
            Endpoint::DataQuality => Self::DataQuality(parse_record(raw)?),
            Endpoint::DataflowPost | Endpoint::DataflowPatch => {
                Self::DataflowUpsert(parse_list(raw)?)
            }
            Endpoint::DataflowDelete => Self::DataflowDelete(parse_list(raw)?),
            Endpoint::PolicyPost | Endpoint::PolicyPut => Self::Progress(
                as_list(raw)
                    .into_iter()
                    .map(progress_line)
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Whether the result reports failures for individual objects
    pub fn has_item_errors(&self) -> bool {
        match self {
            Self::CustomFields(outcomes) => outcomes
                .iter()
                .any(|o| matches!(o, CustomFieldOutcome::Message(_))),
            Self::RelationalUpsert(outcomes) => outcomes.iter().any(|o| !o.errors.is_empty()),
            Self::VirtualDatasource(summary) => {
                !summary.error_objects.is_empty()
                    || summary.error.as_ref().is_some_and(|e| !e.is_null())
            }
            Self::DataflowDelete(outcomes) => outcomes.iter().any(|o| !o.failed.is_empty()),
            _ => false,
        }
    }

    /// The raw value of a passthrough result
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Passthrough(v) => Some(v),
            _ => None,
        }
    }

    /// Serialize back into JSON
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Deserialize into a caller-defined shape
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

/// Record-shaped results sometimes arrive wrapped in a one-element list or
/// as a JSON-encoded string
fn parse_record<T: DeserializeOwned>(raw: Value) -> Result<T> {
    let value = match decode_string(raw) {
        Value::Array(mut items) if items.len() == 1 => decode_string(items.remove(0)),
        other => other,
    };
    if !value.is_object() {
        return Err(Error::Other(format!("expected a record, got {value}")));
    }
    Ok(serde_json::from_value(value)?)
}

fn parse_list<T: DeserializeOwned>(raw: Value) -> Result<Vec<T>> {
    as_list(raw)
        .into_iter()
        .map(|item| Ok(serde_json::from_value(decode_string(item))?))
        .collect()
}

fn as_list(raw: Value) -> Vec<Value> {
    match decode_string(raw) {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Parse a string holding a JSON object or list; other strings are kept
fn decode_string(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                if let Ok(parsed) = serde_json::from_str::<Value>(&s) {
                    return parsed;
                }
            }
            Value::String(s)
        }
        other => other,
    }
}

/// Progress entries must be plain lines; anything structured is left to
/// the passthrough fallback
fn progress_line(line: Value) -> Result<String> {
    match line {
        Value::String(s) => Ok(s),
        other => Err(Error::Other(format!("expected a progress line, got {other}"))),
    }
}

fn custom_field_outcome(item: Value) -> Result<CustomFieldOutcome> {
    match decode_string(item) {
        Value::Object(mut map) => {
            let msg = match map.remove("msg") {
                Some(Value::String(s)) => s,
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            let data: CustomFieldIds = match map.remove("data") {
                Some(data) => serde_json::from_value(data)?,
                None => CustomFieldIds::default(),
            };
            if !map.is_empty() {
                return Err(Error::Other(format!(
                    "unexpected custom field result members: {}",
                    map.keys().cloned().collect::<Vec<_>>().join(", ")
                )));
            }
            Ok(CustomFieldOutcome::Created { msg, data })
        }
        Value::String(s) => Ok(CustomFieldOutcome::Message(s)),
        other => Ok(CustomFieldOutcome::Message(other.to_string())),
    }
}
