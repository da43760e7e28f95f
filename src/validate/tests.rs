//! Tests for the validation module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;
use test_case::test_case;

fn custom_field_schema() -> RecordSchema {
    RecordSchema::new("custom_field")
        .field(FieldRule::required("name_singular", FieldKind::String))
        .field(
            FieldRule::required("field_type", FieldKind::String)
                .one_of(&["PICKER", "MULTI_PICKER", "DATE", "RICH_TEXT"], Case::Upper),
        )
        .field(FieldRule::optional("allow_multiple", FieldKind::Bool))
        .field(
            FieldRule::optional("name_plural", FieldKind::String)
                .required_if("allow_multiple", true),
        )
        .field(FieldRule::optional("options", FieldKind::List))
        .deny_unknown()
}

// ============================================================================
// QueryParams Tests
// ============================================================================

#[test]
fn test_query_params_push_opt_drops_empty() {
    let mut params = QueryParams::new();
    params.push_opt("name", Some("orders"));
    params.push_opt("title", Some(""));
    params.push_opt::<String>("ds_id", None);
    params.push_opt("limit", Some(10));

    assert_eq!(
        params.as_pairs(),
        &[
            ("name".to_string(), "orders".to_string()),
            ("limit".to_string(), "10".to_string())
        ]
    );
}

#[test]
fn test_query_params_list_styles() {
    let mut comma = QueryParams::new();
    comma.push_list("id__in", &[1, 2, 3], ListStyle::Comma);
    assert_eq!(comma.get("id__in"), Some("1,2,3"));

    let mut repeat = QueryParams::new();
    repeat.push_list("id", &[1, 2], ListStyle::Repeat);
    assert_eq!(repeat.get_all("id"), vec!["1", "2"]);

    let mut empty = QueryParams::new();
    empty.push_list::<i64>("id", &[], ListStyle::Comma);
    assert!(empty.is_empty());
}

#[derive(Serialize)]
struct TableParams {
    ds_id: Option<i64>,
    name: Option<String>,
    id: Vec<i64>,
    skip_missing: Option<bool>,
}

#[test]
fn test_query_params_from_serialize() {
    let params = QueryParams::from_serialize(
        &TableParams {
            ds_id: Some(7),
            name: None,
            id: vec![4, 5],
            skip_missing: Some(true),
        },
        ListStyle::Comma,
    )
    .unwrap();

    assert_eq!(params.get("ds_id"), Some("7"));
    assert_eq!(params.get("id"), Some("4,5"));
    assert_eq!(params.get("skip_missing"), Some("true"));
    assert!(!params.contains("name"));
}

#[test]
fn test_query_params_from_serialize_rejects_non_record() {
    let err = QueryParams::from_serialize(&vec![1, 2], ListStyle::Comma).unwrap_err();
    assert!(matches!(err, Error::UnsupportedQueryParams { .. }));
}

#[test]
fn test_query_params_rejects_nested_records() {
    let err = QueryParams::from_value(&json!({"filter": {"a": 1}}), ListStyle::Comma).unwrap_err();
    assert!(matches!(err, Error::UnsupportedQueryParams { .. }));
}

#[test]
fn test_query_params_check_allowed() {
    let params: QueryParams = vec![("ds_id", "1"), ("bogus", "2")].into_iter().collect();
    assert!(params.check_allowed(&["ds_id", "bogus"]).is_ok());
    let err = params.check_allowed(&["ds_id"]).unwrap_err();
    assert!(err.to_string().contains("bogus"));
}

#[test]
fn test_validate_params_shapes() {
    assert!(validate_params(None, &["ds_id"], ListStyle::Comma)
        .unwrap()
        .is_empty());

    let params = validate_params(Some(&json!({"ds_id": 3})), &["ds_id"], ListStyle::Comma).unwrap();
    assert_eq!(params.get("ds_id"), Some("3"));

    let err = validate_params(Some(&json!({"schema_id": 3})), &["ds_id"], ListStyle::Comma)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedQueryParams { .. }));

    let err = validate_params(Some(&json!("ds_id=3")), &["ds_id"], ListStyle::Comma).unwrap_err();
    assert!(matches!(err, Error::UnsupportedQueryParams { .. }));
}

// ============================================================================
// Validate trait Tests
// ============================================================================

#[test]
fn test_value_must_be_record() {
    assert!(json!({"a": 1}).validate().is_ok());
    let err = json!([1]).validate().unwrap_err();
    assert!(matches!(err, Error::UnsupportedPostBody { .. }));
}

// ============================================================================
// RecordSchema Tests
// ============================================================================

#[test]
fn test_schema_canonicalizes_enumeration() {
    let mut value = json!({"name_singular": "Steward", "field_type": "picker"});
    custom_field_schema().normalize(&mut value).unwrap();
    assert_eq!(value["field_type"], "PICKER");
}

#[test]
fn test_schema_canonicalizes_enumeration_lists() {
    let schema = RecordSchema::new("policy").field(
        FieldRule::required("kinds", FieldKind::List).one_of(&["table", "schema"], Case::Lower),
    );
    let mut value = json!({"kinds": ["TABLE", "Schema"]});
    schema.normalize(&mut value).unwrap();
    assert_eq!(value["kinds"], json!(["table", "schema"]));
}

#[test_case(json!({"field_type": "PICKER"}) ; "missing required")]
#[test_case(json!({"name_singular": "  ", "field_type": "PICKER"}) ; "blank required")]
#[test_case(json!({"name_singular": "x", "field_type": "SLIDER"}) ; "enum out of range")]
#[test_case(json!({"name_singular": "x", "field_type": 3}) ; "enum wrong type")]
#[test_case(json!({"name_singular": "x", "field_type": "DATE", "allow_multiple": true}) ; "conditional required")]
#[test_case(json!({"name_singular": "x", "field_type": "DATE", "allow_multiple": "yes"}) ; "wrong kind")]
fn test_schema_rejects_invalid_fields(mut value: serde_json::Value) {
    let err = custom_field_schema().normalize(&mut value).unwrap_err();
    assert!(matches!(err, Error::InvalidPostBody { .. }), "got {err:?}");
}

#[test]
fn test_schema_conditional_field_satisfied() {
    let mut value = json!({
        "name_singular": "Owner",
        "name_plural": "Owners",
        "field_type": "multi_picker",
        "allow_multiple": true
    });
    assert!(custom_field_schema().normalize(&mut value).is_ok());

    let mut single =
        json!({"name_singular": "Owner", "field_type": "DATE", "allow_multiple": false});
    assert!(custom_field_schema().normalize(&mut single).is_ok());
}

#[test]
fn test_schema_rejects_unknown_keys() {
    let mut value = json!({"name_singular": "x", "field_type": "DATE", "colour": "red"});
    let err = custom_field_schema().normalize(&mut value).unwrap_err();
    assert!(matches!(err, Error::UnsupportedPostBody { .. }));
}

#[test]
fn test_schema_rejects_non_record() {
    let mut value = json!("just a string");
    let err = custom_field_schema().normalize(&mut value).unwrap_err();
    assert!(matches!(err, Error::UnsupportedPostBody { .. }));
}

#[test]
fn test_validate_payload_reports_index() {
    let mut items = vec![
        json!({"name_singular": "a", "field_type": "DATE"}),
        json!({"field_type": "DATE"}),
    ];
    let err = validate_payload(&mut items, &[custom_field_schema()]).unwrap_err();
    assert!(err.to_string().contains("item 1"));
}

#[test]
fn test_validate_payload_without_schema() {
    let mut items = vec![json!({"a": 1}), json!(2)];
    let err = validate_payload(&mut items, &[]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedPostBody { .. }));
}

#[test]
fn test_validate_payload_any_of_schemas() {
    let folder = RecordSchema::new("folder")
        .field(FieldRule::required("title", FieldKind::String))
        .field(FieldRule::required("document_hub_id", FieldKind::Integer))
        .deny_unknown();
    let term = RecordSchema::new("term")
        .field(FieldRule::required("title", FieldKind::String))
        .field(FieldRule::required("glossary_ids", FieldKind::List))
        .deny_unknown();

    let mut items = vec![
        json!({"title": "f", "document_hub_id": 1}),
        json!({"title": "t", "glossary_ids": [2]}),
    ];
    assert!(validate_payload(&mut items, &[folder.clone(), term.clone()]).is_ok());

    let mut bad = vec![json!({"title": "x", "owner": 1})];
    let err = validate_payload(&mut bad, &[folder, term]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedPostBody { .. }));
    assert!(err.to_string().contains("folder"));
    assert!(err.to_string().contains("term"));
}
