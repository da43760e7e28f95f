//! Typed shapes of job results
//!
//! Field names serialize in camelCase; snake_case spellings the server
//! uses are accepted as aliases. Every shape keeps unmodelled members in
//! an `extra` map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An object created or updated by a write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Document, folder and term create
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedObjects {
    #[serde(
        default,
        alias = "created_count",
        alias = "created_term_count",
        alias = "created_document_count",
        alias = "created_folder_count"
    )]
    pub created_count: u64,
    #[serde(
        default,
        alias = "created_objects",
        alias = "created_terms",
        alias = "created_documents",
        alias = "created_folders"
    )]
    pub created_objects: Vec<ObjectRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Document and folder update
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedObjects {
    #[serde(
        default,
        alias = "updated_count",
        alias = "updated_document_count",
        alias = "updated_folder_count"
    )]
    pub updated_count: u64,
    #[serde(
        default,
        alias = "updated_objects",
        alias = "updated_documents",
        alias = "updated_folders"
    )]
    pub updated_objects: Vec<ObjectRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Document, folder and term delete
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedObjects {
    #[serde(
        default,
        alias = "deleted_count",
        alias = "deleted_term_count",
        alias = "deleted_document_count",
        alias = "deleted_folder_count"
    )]
    pub deleted_count: u64,
    #[serde(
        default,
        alias = "deleted_ids",
        alias = "deleted_term_ids",
        alias = "deleted_document_ids",
        alias = "deleted_folder_ids"
    )]
    pub deleted_ids: Vec<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ids of created custom fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldIds {
    #[serde(default, alias = "field_ids")]
    pub field_ids: Vec<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of a custom field create result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CustomFieldOutcome {
    Created {
        msg: String,
        data: CustomFieldIds,
    },
    /// A server message that is not a creation record, such as a
    /// validation error
    Message(String),
}

/// Key to id mapping of a relational upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMapping {
    pub id: i64,
    pub key: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of a relational (rdbms) upsert result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationalOutcome {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub mapping: Vec<KeyMapping>,
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Virtual data source ingestion summary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDatasourceSummary {
    #[serde(default, alias = "number_received")]
    pub number_received: u64,
    #[serde(default, alias = "updated_objects")]
    pub updated_objects: u64,
    #[serde(default, alias = "error_objects")]
    pub error_objects: Vec<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Count and sample of affected objects
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionCount {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub sample: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-action counters of a data quality upload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStats {
    #[serde(default)]
    pub created: ActionCount,
    #[serde(default)]
    pub updated: ActionCount,
    #[serde(default)]
    pub deleted: ActionCount,
    #[serde(default, alias = "not_found")]
    pub not_found: ActionCount,
    /// Actions not modelled above, such as `skipped`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Data quality upload summary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualitySummary {
    #[serde(default)]
    pub fields: ActionStats,
    #[serde(default)]
    pub values: ActionStats,
    #[serde(default, alias = "created_object_attribution")]
    pub created_object_attribution: Value,
    #[serde(default, alias = "flag_counts")]
    pub flag_counts: Value,
    #[serde(default, alias = "total_duration")]
    pub total_duration: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// External id to catalog id mapping of a dataflow write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataflowMapping {
    pub id: i64,
    #[serde(alias = "external_id")]
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced: Option<bool>,
    #[serde(default, alias = "impacted_dfos", skip_serializing_if = "Vec::is_empty")]
    pub impacted_dfos: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of a dataflow post, patch or delete result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataflowOutcome {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub mapping: Vec<DataflowMapping>,
    /// Only populated by deletes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
