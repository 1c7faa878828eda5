//! Field paths and field-level validation errors
//!
//! Invalid documents are never reported through `Result`: validation
//! returns an [`ErrorList`], ordered and comparable, and an empty list means
//! the document is valid.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A path to a field inside a document, rendered `spec.routes[0].match`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
    Key(String),
}

impl Path {
    /// A path starting at the named top-level field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Field(name.into())],
        }
    }

    /// The empty path, for errors about the whole document
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        self.with(Segment::Field(name.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(Segment::Index(index))
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.with(Segment::Key(key.into()))
    }

    fn with(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{name}")?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

/// The class of a field error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "FieldValueNotFound")]
    NotFound,
    #[serde(rename = "FieldValueRequired")]
    Required,
    #[serde(rename = "FieldValueDuplicate")]
    Duplicate,
    #[serde(rename = "FieldValueInvalid")]
    Invalid,
    #[serde(rename = "FieldValueNotSupported")]
    NotSupported,
    #[serde(rename = "FieldValueForbidden")]
    Forbidden,
    #[serde(rename = "FieldValueTooLong")]
    TooLong,
    #[serde(rename = "FieldValueTooMany")]
    TooMany,
    #[serde(rename = "InternalError")]
    Internal,
    #[serde(rename = "FieldValueTypeInvalid")]
    TypeInvalid,
}

impl ErrorType {
    /// Human readable label used when rendering an error
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFound => "Not found",
            Self::Required => "Required value",
            Self::Duplicate => "Duplicate value",
            Self::Invalid => "Invalid value",
            Self::NotSupported => "Unsupported value",
            Self::Forbidden => "Forbidden",
            Self::TooLong => "Too long",
            Self::TooMany => "Too many",
            Self::Internal => "Internal error",
            Self::TypeInvalid => "Invalid value",
        }
    }

    /// Whether the offending value is left out of the rendered message
    fn hides_value(&self) -> bool {
        matches!(
            self,
            Self::Required | Self::Forbidden | Self::TooLong | Self::Internal
        )
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validation failure attributed to a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub field: String,
    #[serde(rename = "badValue")]
    pub bad_value: Value,
    pub detail: String,
}

pub type ErrorList = Vec<FieldError>;

impl FieldError {
    pub fn new(
        error_type: ErrorType,
        path: &Path,
        bad_value: impl Into<Value>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            field: path.to_string(),
            bad_value: bad_value.into(),
            detail: detail.into(),
        }
    }

    pub fn required(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Required, path, "", detail)
    }

    pub fn invalid(path: &Path, value: impl Into<Value>, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Invalid, path, value, detail)
    }

    pub fn type_invalid(path: &Path, value: impl Into<Value>, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::TypeInvalid, path, value, detail)
    }

    pub fn forbidden(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Forbidden, path, "", detail)
    }

    pub fn duplicate(path: &Path, value: impl Into<Value>) -> Self {
        Self::new(ErrorType::Duplicate, path, value, "")
    }

    pub fn not_found(path: &Path, value: impl Into<Value>) -> Self {
        Self::new(ErrorType::NotFound, path, value, "")
    }

    pub fn internal(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Internal, path, Value::Null, detail)
    }

    /// An enum violation listing the accepted values
    pub fn not_supported<S: AsRef<str>>(path: &Path, value: impl Into<Value>, supported: &[S]) -> Self {
        let detail = if supported.is_empty() {
            String::new()
        } else {
            let quoted: Vec<String> = supported
                .iter()
                .map(|s| format!("{:?}", s.as_ref()))
                .collect();
            format!("supported values: {}", quoted.join(", "))
        };
        Self::new(ErrorType::NotSupported, path, value, detail)
    }

    /// A string longer than `max` bytes. The value itself is not echoed back.
    pub fn too_long(path: &Path, max: usize) -> Self {
        Self::new(
            ErrorType::TooLong,
            path,
            "<value omitted>",
            format!("may not be more than {max} bytes"),
        )
    }

    /// A collection holding `actual` entries where at most `max` are allowed
    pub fn too_many(path: &Path, actual: usize, max: usize) -> Self {
        Self::new(
            ErrorType::TooMany,
            path,
            actual,
            format!("must have at most {max} items"),
        )
    }

    /// The message without the field path
    pub fn body(&self) -> String {
        let mut body = if self.error_type.hides_value() {
            self.error_type.label().to_string()
        } else {
            format!("{}: {}", self.error_type, render_value(&self.bad_value))
        };
        if !self.detail.is_empty() {
            body.push_str(": ");
            body.push_str(&self.detail);
        }
        body
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.body())
    }
}

impl std::error::Error for FieldError {}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_rendering() {
        let path = Path::new("spec")
            .child("routes")
            .index(0)
            .child("match");
        assert_eq!(path.to_string(), "spec.routes[0].match");

        let labels = Path::new("metadata").child("labels").key("app.kubernetes.io/name");
        assert_eq!(labels.to_string(), "metadata.labels[app.kubernetes.io/name]");

        assert_eq!(Path::root().to_string(), "");
        assert_eq!(Path::root().child("spec").to_string(), "spec");
    }

    #[test]
    fn test_error_display() {
        let path = Path::new("spec").child("limit");
        let err = FieldError::invalid(&path, -10, "must be a positive number");
        assert_eq!(err.to_string(), "spec.limit: Invalid value: -10: must be a positive number");

        let err = FieldError::invalid(&path, "object", "duplicate domains");
        assert_eq!(err.to_string(), r#"spec.limit: Invalid value: "object": duplicate domains"#);

        let err = FieldError::required(&Path::new("metadata").child("name"), "name or generateName is required");
        assert_eq!(
            err.to_string(),
            "metadata.name: Required value: name or generateName is required"
        );
    }

    #[test]
    fn test_constructors() {
        let path = Path::new("spec").child("mode");
        let err = FieldError::not_supported(&path, "x", &["a", "b"]);
        assert_eq!(err.detail, r#"supported values: "a", "b""#);
        assert_eq!(err.bad_value, json!("x"));

        let err = FieldError::too_long(&path, 10);
        assert_eq!(err.bad_value, json!("<value omitted>"));
        assert_eq!(err.to_string(), "spec.mode: Too long: may not be more than 10 bytes");

        let err = FieldError::too_many(&path, 4, 3);
        assert_eq!(err.bad_value, json!(4));
        assert_eq!(err.detail, "must have at most 3 items");
    }

    #[test]
    fn test_serialize() {
        let err = FieldError::invalid(&Path::new("spec"), "object", "failed rule: self.a");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FieldValueInvalid",
                "field": "spec",
                "badValue": "object",
                "detail": "failed rule: self.a",
            })
        );
    }
}
