//! Request and response bodies
//!
//! Outgoing bodies are JSON (with `null` members stripped unless asked
//! otherwise), raw bytes for newline-delimited JSON, or a multipart form.
//! Incoming bodies are decoded as JSON, then UTF-8 text, then raw bytes.

use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Header carrying the relative path of the next page
pub const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Default content type for JSON requests
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// ============================================================================
// Request Body
// ============================================================================

/// Body of an outgoing request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON body; `null` object members are removed before sending
    Json(Value),
    /// JSON body sent exactly as given, `null` members included
    JsonWithNulls(Value),
    /// Pre-encoded bytes with an explicit content type
    Raw { bytes: Bytes, content_type: String },
    /// Multipart form; the form encoder picks the content type
    Multipart(MultipartForm),
}

impl RequestBody {
    /// JSON body from any serializable value
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Newline-delimited JSON, one serialized item per line
    pub fn ndjson<T: Serialize>(items: &[T]) -> Result<Self> {
        Ok(Self::Raw {
            bytes: encode_ndjson(items)?,
            content_type: "application/json".to_string(),
        })
    }

    /// Raw bytes sent with a JSON content type
    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        Self::Raw {
            bytes: bytes.into(),
            content_type: "application/json".to_string(),
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Encode items as newline-delimited JSON
pub fn encode_ndjson<T: Serialize>(items: &[T]) -> Result<Bytes> {
    let mut out = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        serde_json::to_writer(&mut out, item)?;
    }
    Ok(Bytes::from(out))
}

/// Recursively remove `null` members from JSON objects
///
/// Array elements are kept in place even when they are `null` so that
/// positional payloads are not shifted.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

// ============================================================================
// Multipart
// ============================================================================

/// A clonable multipart form description
///
/// Kept as plain data so it can be rebuilt for every retry attempt.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

#[derive(Debug, Clone)]
struct FormPart {
    name: String,
    content: PartContent,
}

#[derive(Debug, Clone)]
enum PartContent {
    Text(String),
    File {
        file_name: String,
        bytes: Bytes,
        mime: Option<String>,
    },
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            content: PartContent::Text(value.into()),
        });
        self
    }

    /// Add a file part (e.g. `csv_file` or `file`)
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            content: PartContent::File {
                file_name: file_name.into(),
                bytes: bytes.into(),
                mime: mime.map(String::from),
            },
        });
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(crate) fn to_reqwest(&self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match &part.content {
                PartContent::Text(value) => form.text(part.name.clone(), value.clone()),
                PartContent::File {
                    file_name,
                    bytes,
                    mime,
                } => {
                    let mut p = reqwest::multipart::Part::bytes(bytes.to_vec())
                        .file_name(file_name.clone());
                    if let Some(mime) = mime {
                        p = p.mime_str(mime)?;
                    }
                    form.part(part.name.clone(), p)
                }
            };
        }
        Ok(form)
    }
}

// ============================================================================
// Response Body
// ============================================================================

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Bytes(Bytes),
}

impl ResponseBody {
    /// Decode as JSON, falling back to UTF-8 text, then raw bytes
    pub fn decode(bytes: Bytes) -> Self {
        if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
            return Self::Json(value);
        }
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Self::Text(text),
            Err(_) => Self::Bytes(bytes),
        }
    }

    /// An empty text body
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        self.as_json().and_then(Value::as_array)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        self.as_array().is_some()
    }

    /// Number of objects in a list body (for request logging)
    pub fn objects_returned(&self) -> Option<usize> {
        self.as_array().map(Vec::len)
    }

    /// Convert into a JSON value without losing content
    ///
    /// Text becomes a JSON string, undecodable bytes an array of numbers.
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Text(s) => Value::String(s),
            Self::Bytes(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
        }
    }

    /// Deserialize a JSON body into a typed value
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Self::Json(v) => Ok(T::deserialize(v)?),
            Self::Text(s) => Err(Error::Other(format!("expected JSON body, got text: {s}"))),
            Self::Bytes(b) => Err(Error::Other(format!(
                "expected JSON body, got {} raw bytes",
                b.len()
            ))),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A successful, fully decoded HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Final request URL
    pub url: String,
    /// Response headers (case-insensitive lookup)
    pub headers: HeaderMap,
    /// Decoded body
    pub body: ResponseBody,
}

impl Response {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Relative path of the next page, if the server sent one
    pub fn next_page(&self) -> Option<&str> {
        self.header(NEXT_PAGE_HEADER).filter(|v| !v.trim().is_empty())
    }

    /// Deserialize the JSON body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        self.body.parse()
    }
}

/// Statuses the catalog treats as success
pub fn is_success_status(status: u16) -> bool {
    matches!(status, 200 | 201 | 202 | 204)
}
