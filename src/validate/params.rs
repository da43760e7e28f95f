//! Query parameter serialization
//!
//! Parameters are an ordered list of `(name, value)` pairs. Absent and
//! empty values are dropped; list values are either joined with `,` or
//! repeated, depending on what the endpoint expects.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// How list-valued parameters are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStyle {
    /// `k=v1,v2` for endpoints that take a scalar parameter
    #[default]
    Comma,
    /// `k=v1&k=v2`
    Repeat,
}

/// Ordered query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Append a parameter unless it is absent or empty
    pub fn push_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.pairs.push((key.into(), value));
            }
        }
    }

    /// Append a list parameter; an empty list is dropped
    pub fn push_list<V: ToString>(
        &mut self,
        key: impl Into<String>,
        values: &[V],
        style: ListStyle,
    ) {
        if values.is_empty() {
            return;
        }
        let key = key.into();
        match style {
            ListStyle::Comma => {
                let joined = values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                self.pairs.push((key, joined));
            }
            ListStyle::Repeat => {
                for value in values {
                    self.pairs.push((key.clone(), value.to_string()));
                }
            }
        }
    }

    /// Builder-style append
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn extend(&mut self, other: QueryParams) {
        self.pairs.extend(other.pairs);
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize a typed parameter record
    ///
    /// The record must serialize to a JSON object; `None` fields and empty
    /// strings or lists are dropped.
    pub fn from_serialize<T: Serialize>(params: &T, style: ListStyle) -> Result<Self> {
        let value = serde_json::to_value(params)?;
        Self::from_value(&value, style)
    }

    /// Build from a JSON object
    pub fn from_value(value: &Value, style: ListStyle) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            Error::unsupported_params(format!("expected a parameter record, got {value}"))
        })?;

        let mut params = Self::new();
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    let items = items
                        .iter()
                        .filter(|v| !v.is_null())
                        .map(|v| scalar_to_string(key, v))
                        .collect::<Result<Vec<_>>>()?;
                    params.push_list(key.as_str(), &items, style);
                }
                other => params.push_opt(key.as_str(), Some(scalar_to_string(key, other)?)),
            }
        }
        Ok(params)
    }

    /// Reject parameters whose names are not in `allowed`
    pub fn check_allowed(&self, allowed: &[&str]) -> Result<()> {
        match self.pairs.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
            Some((key, _)) => Err(Error::unsupported_params(format!(
                "unknown parameter '{key}', expected one of: {}",
                allowed.join(", ")
            ))),
            None => Ok(()),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::unsupported_params(format!(
            "parameter '{key}' must be a scalar or a list of scalars, got {other}"
        ))),
    }
}

/// ParamsShape check for loosely typed callers
///
/// The supplied value must be absent or a record whose keys are all in
/// `allowed`. Returns the serialized parameters.
pub fn validate_params(
    params: Option<&Value>,
    allowed: &[&str],
    style: ListStyle,
) -> Result<QueryParams> {
    match params {
        None | Some(Value::Null) => Ok(QueryParams::new()),
        Some(value) => {
            let map = value.as_object().ok_or_else(|| {
                Error::unsupported_params(format!("expected a parameter record, got {value}"))
            })?;
            if let Some(key) = map.keys().find(|k| !allowed.contains(&k.as_str())) {
                return Err(Error::unsupported_params(format!(
                    "unknown parameter '{key}', expected one of: {}",
                    allowed.join(", ")
                )));
            }
            QueryParams::from_value(value, style)
        }
    }
}
