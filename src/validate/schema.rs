//! Payload validation
//!
//! Typed payloads implement [`Validate`]. Loosely typed JSON payloads are
//! checked against one or more [`RecordSchema`]s, which also rewrite
//! enumeration values into the server's canonical case.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Pre-flight check implemented by request payloads
pub trait Validate {
    /// Return `InvalidPostBody` (or `UnsupportedPostBody`) when the payload
    /// cannot be sent as is
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Validate for Value {
    fn validate(&self) -> Result<()> {
        if self.is_object() {
            Ok(())
        } else {
            Err(Error::unsupported_body(format!(
                "expected a record, got {}",
                type_name(self)
            )))
        }
    }
}

impl Validate for Map<String, Value> {}

/// Expected JSON type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Bool,
    List,
    Object,
    Any,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::List => value.is_array(),
            FieldKind::Object => value.is_object(),
            FieldKind::Any => true,
        }
    }
}

/// Canonical case of an enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Lower,
    Upper,
    Exact,
}

impl Case {
    fn apply(self, s: &str) -> String {
        match self {
            Case::Lower => s.to_lowercase(),
            Case::Upper => s.to_uppercase(),
            Case::Exact => s.to_string(),
        }
    }
}

/// Rule for one field of a record
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    kind: FieldKind,
    required: bool,
    allowed: Option<(Vec<String>, Case)>,
    required_if: Option<(String, Value)>,
}

impl FieldRule {
    /// A field that must be present and non-empty
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            allowed: None,
            required_if: None,
        }
    }

    /// A field that may be absent or `null`
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    /// Restrict string values to an enumeration, compared in `case`
    #[must_use]
    pub fn one_of(mut self, values: &[&str], case: Case) -> Self {
        self.allowed = Some((values.iter().map(|v| case.apply(v)).collect(), case));
        self
    }

    /// Require this field when `field` equals `value`
    #[must_use]
    pub fn required_if(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.required_if = Some((field.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_required_for(&self, record: &Map<String, Value>) -> bool {
        self.required
            || self
                .required_if
                .as_ref()
                .is_some_and(|(field, expected)| record.get(field) == Some(expected))
    }

    fn canonicalize(&self, schema: &str, value: &mut Value) -> Result<()> {
        let Some((allowed, case)) = &self.allowed else {
            return Ok(());
        };
        match value {
            Value::String(s) => {
                let canonical = case.apply(s);
                if !allowed.contains(&canonical) {
                    return Err(Error::invalid_body(format!(
                        "{schema}: '{}' must be one of [{}], got '{s}'",
                        self.name,
                        allowed.join(", ")
                    )));
                }
                *s = canonical;
                Ok(())
            }
            Value::Array(items) => items
                .iter_mut()
                .try_for_each(|item| self.canonicalize(schema, item)),
            other => Err(Error::invalid_body(format!(
                "{schema}: '{}' must be one of [{}], got {other}",
                self.name,
                allowed.join(", ")
            ))),
        }
    }
}

/// Declarative schema for a loosely typed record
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldRule>,
    deny_unknown: bool,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            deny_unknown: false,
        }
    }

    #[must_use]
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Reject keys that have no rule
    #[must_use]
    pub fn deny_unknown(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// PayloadShape: the value is a record with only known keys
    pub fn check_shape(&self, value: &Value) -> Result<()> {
        let record = value.as_object().ok_or_else(|| {
            Error::unsupported_body(format!(
                "{}: expected a record, got {}",
                self.name,
                type_name(value)
            ))
        })?;
        if self.deny_unknown {
            if let Some(key) = record
                .keys()
                .find(|k| !self.fields.iter().any(|f| &f.name == *k))
            {
                return Err(Error::unsupported_body(format!(
                    "{}: unexpected field '{key}'",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// PayloadShape + FieldShape, rewriting enumerations to canonical case
    pub fn normalize(&self, value: &mut Value) -> Result<()> {
        self.check_shape(value)?;
        let Value::Object(record) = value else {
            return Ok(());
        };

        for rule in &self.fields {
            let required = rule.is_required_for(record);
            match record.get_mut(&rule.name) {
                Some(v) if !is_empty(v) => {
                    if !rule.kind.accepts(v) {
                        return Err(Error::invalid_body(format!(
                            "{}: '{}' must be of type {:?}, got {}",
                            self.name,
                            rule.name,
                            rule.kind,
                            type_name(v)
                        )));
                    }
                    rule.canonicalize(&self.name, v)?;
                }
                _ if required => {
                    return Err(Error::invalid_body(format!(
                        "{}: '{}' is required",
                        self.name, rule.name
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Validate every element of a list payload
///
/// With no schemas each element only has to be a record. With several,
/// an element must satisfy at least one; the first passing schema's
/// normalization is kept.
pub fn validate_payload(items: &mut [Value], schemas: &[RecordSchema]) -> Result<()> {
    for (index, item) in items.iter_mut().enumerate() {
        match schemas {
            [] => item.validate(),
            [schema] => schema.normalize(item),
            many => validate_any(item, many),
        }
        .map_err(|e| with_index(e, index))?;
    }
    Ok(())
}

fn validate_any(item: &mut Value, schemas: &[RecordSchema]) -> Result<()> {
    let mut failures = Vec::new();
    for schema in schemas {
        let mut candidate = item.clone();
        match schema.normalize(&mut candidate) {
            Ok(()) => {
                *item = candidate;
                return Ok(());
            }
            Err(e) => failures.push(e.to_string()),
        }
    }
    Err(Error::unsupported_body(format!(
        "matches none of the expected records: {}",
        failures.join("; ")
    )))
}

fn with_index(err: Error, index: usize) -> Error {
    match err {
        Error::UnsupportedPostBody { message } => Error::UnsupportedPostBody {
            message: format!("item {index}: {message}"),
        },
        Error::InvalidPostBody { message } => Error::InvalidPostBody {
            message: format!("item {index}: {message}"),
        },
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "record",
    }
}
