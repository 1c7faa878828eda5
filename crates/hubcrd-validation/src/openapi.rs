//! OpenAPI schema validation
//!
//! The CRD schema is rewritten as a draft-4 JSON Schema and compiled with
//! `jsonschema`. Violations are then reported the way the API server
//! reports them, with kube-openapi messages attached to field paths.

use hubcrd_core::{ErrorList, FieldError, JSONSchemaProps, Path};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, ValidationError as SchemaError};
use serde_json::{Map, Value, json};
use tracing::trace;

use crate::error::{Result, ValidationError};
use crate::formats::{self, FORMAT_PREFIX};

/// Validates documents against one CRD version schema
pub struct SchemaValidator {
    schema: Value,
    compiled: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    pub fn new(props: &JSONSchemaProps) -> Result<Self> {
        let raw = serde_json::to_value(props)?;
        Self::from_value(&raw)
    }

    pub fn from_value(raw: &Value) -> Result<Self> {
        let schema = to_draft4(raw);

        let mut options = jsonschema::options();
        options.with_draft(Draft::Draft4).should_validate_formats(true);
        for (name, check) in formats::all() {
            options.with_format(format!("{FORMAT_PREFIX}{name}"), check);
        }

        let compiled = options
            .build(&schema)
            .map_err(|e| ValidationError::invalid_schema("openAPIV3Schema", e.to_string()))?;

        Ok(Self { schema, compiled })
    }

    /// The draft-4 schema the validator was compiled from
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn validate(&self, document: &Value) -> ErrorList {
        if self.compiled.is_valid(document) {
            return ErrorList::new();
        }

        self.compiled
            .iter_errors(document)
            .map(|e| self.field_error(document, &e))
            .collect()
    }

    fn field_error(&self, document: &Value, error: &SchemaError<'_>) -> FieldError {
        let path = field_path(document, &error.instance_path.to_string());
        let schema_pointer = error.schema_path.to_string();
        let (parent_pointer, keyword) = schema_pointer
            .rsplit_once('/')
            .unwrap_or(("", schema_pointer.as_str()));
        let parent = self.schema.pointer(parent_pointer).and_then(Value::as_object);
        let limit = parent.and_then(|p| p.get(keyword));
        let instance = error.instance.as_ref();

        trace!(field = %path, keyword, "schema violation");

        let in_body = |message: String| format!("{path} in body {message}");
        let number = |value: Option<&Value>| value.map(Value::to_string).unwrap_or_default();
        let count = |value: Option<&Value>| {
            value
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or_default()
        };

        match keyword {
            "required" => {
                if let ValidationErrorKind::Required { property } = &error.kind {
                    let name = property.as_str().map(str::to_string).unwrap_or_else(|| property.to_string());
                    return FieldError::required(&path.child(name), "");
                }
                FieldError::required(&path, "")
            }
            "type" => {
                let expected = match limit {
                    Some(Value::Array(types)) => types
                        .iter()
                        .filter_map(Value::as_str)
                        .find(|t| *t != "null")
                        .unwrap_or_default()
                        .to_string(),
                    other => other.and_then(Value::as_str).unwrap_or_default().to_string(),
                };
                let actual = type_name(instance);
                FieldError::type_invalid(
                    &path,
                    actual,
                    in_body(format!("must be of type {expected}: {actual:?}")),
                )
            }
            "format" => {
                let format = limit
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim_start_matches(FORMAT_PREFIX);
                let value = instance.as_str().unwrap_or_default();
                FieldError::type_invalid(
                    &path,
                    instance.clone(),
                    in_body(format!("must be of type {format}: {value:?}")),
                )
            }
            "enum" => {
                let supported: Vec<String> = limit
                    .and_then(Value::as_array)
                    .map(|values| {
                        values
                            .iter()
                            .filter(|v| !v.is_null())
                            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                            .collect()
                    })
                    .unwrap_or_default();
                FieldError::not_supported(&path, instance.clone(), &supported)
            }
            "maxLength" => FieldError::too_long(&path, count(limit)),
            "maxItems" | "maxProperties" => FieldError::too_many(&path, size(instance), count(limit)),
            "minItems" => FieldError::invalid(
                &path,
                size(instance),
                in_body(format!("should have at least {} items", number(limit))),
            ),
            "minProperties" => FieldError::invalid(
                &path,
                size(instance),
                in_body(format!("should have at least {} properties", number(limit))),
            ),
            "minLength" => FieldError::invalid(
                &path,
                instance.clone(),
                in_body(format!("should be at least {} chars long", number(limit))),
            ),
            "minimum" | "exclusiveMinimum" => {
                let exclusive = flag(parent, "exclusiveMinimum");
                let bound = number(parent.and_then(|p| p.get("minimum")));
                let message = if exclusive {
                    format!("should be greater than {bound}")
                } else {
                    format!("should be greater than or equal to {bound}")
                };
                FieldError::invalid(&path, instance.clone(), in_body(message))
            }
            "maximum" | "exclusiveMaximum" => {
                let exclusive = flag(parent, "exclusiveMaximum");
                let bound = number(parent.and_then(|p| p.get("maximum")));
                let message = if exclusive {
                    format!("should be less than {bound}")
                } else {
                    format!("should be less than or equal to {bound}")
                };
                FieldError::invalid(&path, instance.clone(), in_body(message))
            }
            "multipleOf" => FieldError::invalid(
                &path,
                instance.clone(),
                in_body(format!("should be a multiple of {}", number(limit))),
            ),
            "pattern" => {
                let pattern = limit.and_then(Value::as_str).unwrap_or_default();
                FieldError::invalid(
                    &path,
                    instance.clone(),
                    in_body(format!("should match '{pattern}'")),
                )
            }
            "uniqueItems" => FieldError::invalid(
                &path,
                instance.clone(),
                in_body("shouldn't contain duplicates".to_string()),
            ),
            "anyOf" => FieldError::invalid(
                &path,
                instance.clone(),
                in_body("must validate at least one schema (anyOf)".to_string()),
            ),
            "oneOf" => FieldError::invalid(
                &path,
                instance.clone(),
                in_body("must validate one and only one schema (oneOf)".to_string()),
            ),
            "allOf" => FieldError::invalid(
                &path,
                instance.clone(),
                in_body("must validate all the schemas (allOf)".to_string()),
            ),
            "not" => FieldError::invalid(
                &path,
                instance.clone(),
                in_body("must not validate the schema (not)".to_string()),
            ),
            _ => FieldError::invalid(&path, instance.clone(), error.to_string()),
        }
    }
}

/// Rewrite a Kubernetes structural schema as a draft-4 JSON Schema
///
/// `nullable` becomes a `null` type union, int-or-string nodes lose their
/// type, known formats are prefixed and unknown ones dropped, and the
/// `x-kubernetes-*` extensions are removed.
pub fn to_draft4(schema: &Value) -> Value {
    let Some(object) = schema.as_object() else {
        return schema.clone();
    };

    let nullable = flag(Some(object), "nullable");
    let int_or_string = flag(Some(object), "x-kubernetes-int-or-string");
    let mut out = Map::new();

    for (key, value) in object {
        match key.as_str() {
            "nullable" | "default" | "example" | "externalDocs" => {}
            k if k.starts_with("x-kubernetes-") => {}
            "type" => {
                if int_or_string {
                    continue;
                }
                if nullable {
                    out.insert(key.clone(), json!([value, "null"]));
                } else {
                    out.insert(key.clone(), value.clone());
                }
            }
            "format" => {
                if let Some(format) = value.as_str().filter(|f| formats::lookup(f).is_some()) {
                    out.insert(key.clone(), json!(format!("{FORMAT_PREFIX}{format}")));
                }
            }
            "enum" => {
                let mut values = value.as_array().cloned().unwrap_or_default();
                if nullable && !values.contains(&Value::Null) {
                    values.push(Value::Null);
                }
                out.insert(key.clone(), Value::Array(values));
            }
            "properties" | "patternProperties" | "definitions" => {
                let converted = value
                    .as_object()
                    .map(|m| {
                        m.iter()
                            .map(|(name, sub)| (name.clone(), to_draft4(sub)))
                            .collect::<Map<_, _>>()
                    })
                    .unwrap_or_default();
                out.insert(key.clone(), Value::Object(converted));
            }
            "allOf" | "anyOf" | "oneOf" => {
                let converted = value
                    .as_array()
                    .map(|schemas| schemas.iter().map(to_draft4).collect())
                    .unwrap_or_default();
                out.insert(key.clone(), Value::Array(converted));
            }
            "items" | "additionalProperties" | "not" => {
                out.insert(key.clone(), to_draft4(value));
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    Value::Object(out)
}

/// Turn a JSON pointer into the document into a field path, using the
/// document to tell list indices from map keys
fn field_path(document: &Value, pointer: &str) -> Path {
    let mut path = Path::root();
    let mut current = Some(document);

    for token in pointer.split('/').skip(1) {
        let token = token.replace("~1", "/").replace("~0", "~");
        match current {
            Some(Value::Array(items)) => {
                let index: usize = token.parse().unwrap_or_default();
                current = items.get(index);
                path = path.index(index);
            }
            Some(Value::Object(fields)) => {
                current = fields.get(&token);
                path = path.child(token);
            }
            _ => {
                current = None;
                path = path.child(token);
            }
        }
    }

    path
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn size(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(fields) => fields.len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    }
}

fn flag(object: Option<&Map<String, Value>>, key: &str) -> bool {
    object
        .and_then(|o| o.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubcrd_core::ErrorType;

    fn validator(schema: Value) -> SchemaValidator {
        SchemaValidator::from_value(&schema).unwrap()
    }

    fn rate_limit_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "spec": {
                    "type": "object",
                    "required": ["limit"],
                    "properties": {
                        "limit": {"type": "integer"},
                        "strategy": {"type": "string", "enum": ["local", "distributed"]},
                        "period": {"type": "string", "format": "duration"},
                        "title": {"type": "string", "maxLength": 5},
                        "groups": {"type": "array", "maxItems": 2, "minItems": 1, "items": {"type": "string"}}
                    }
                }
            }
        })
    }

    #[test]
    fn test_valid_document() {
        let document = json!({"spec": {"limit": 3, "strategy": "local", "period": "1m"}});
        assert!(validator(rate_limit_schema()).validate(&document).is_empty());
    }

    #[test]
    fn test_required() {
        let errors = validator(rate_limit_schema()).validate(&json!({"spec": {}}));
        assert_eq!(errors, vec![FieldError::required(&Path::new("spec").child("limit"), "")]);
    }

    #[test]
    fn test_type_mismatch() {
        let errors = validator(rate_limit_schema()).validate(&json!({"spec": {"limit": "ten"}}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::TypeInvalid);
        assert_eq!(errors[0].field, "spec.limit");
        assert_eq!(errors[0].bad_value, json!("string"));
        assert_eq!(
            errors[0].detail,
            r#"spec.limit in body must be of type integer: "string""#
        );
    }

    #[test]
    fn test_enum() {
        let errors =
            validator(rate_limit_schema()).validate(&json!({"spec": {"limit": 1, "strategy": "yolo"}}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::NotSupported);
        assert_eq!(errors[0].bad_value, json!("yolo"));
        assert_eq!(errors[0].detail, r#"supported values: "local", "distributed""#);
    }

    #[test]
    fn test_format() {
        let errors =
            validator(rate_limit_schema()).validate(&json!({"spec": {"limit": 1, "period": "soon"}}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::TypeInvalid);
        assert_eq!(
            errors[0].detail,
            r#"spec.period in body must be of type duration: "soon""#
        );
    }

    #[test]
    fn test_lengths_and_counts() {
        let errors = validator(rate_limit_schema())
            .validate(&json!({"spec": {"limit": 1, "title": "too long", "groups": ["a", "b", "c"]}}));
        assert_eq!(errors.len(), 2);

        let too_long = errors.iter().find(|e| e.field == "spec.title").unwrap();
        assert_eq!(too_long.error_type, ErrorType::TooLong);
        assert_eq!(too_long.bad_value, json!("<value omitted>"));
        assert_eq!(too_long.detail, "may not be more than 5 bytes");

        let too_many = errors.iter().find(|e| e.field == "spec.groups").unwrap();
        assert_eq!(too_many.error_type, ErrorType::TooMany);
        assert_eq!(too_many.bad_value, json!(3));
        assert_eq!(too_many.detail, "must have at most 2 items");
    }

    #[test]
    fn test_min_items() {
        let errors =
            validator(rate_limit_schema()).validate(&json!({"spec": {"limit": 1, "groups": []}}));
        assert_eq!(
            errors,
            vec![FieldError::invalid(
                &Path::new("spec").child("groups"),
                0,
                "spec.groups in body should have at least 1 items"
            )]
        );
    }

    #[test]
    fn test_nested_index_path() {
        let schema = json!({
            "type": "object",
            "properties": {
                "spec": {
                    "type": "object",
                    "properties": {
                        "sets": {
                            "type": "array",
                            "items": {"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}
                        }
                    }
                }
            }
        });
        let errors = validator(schema).validate(&json!({"spec": {"sets": [{}]}}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "spec.sets[0].name");
        assert_eq!(errors[0].error_type, ErrorType::Required);
    }

    #[test]
    fn test_minimum() {
        let schema = json!({"type": "object", "properties": {"n": {"type": "integer", "minimum": 0}}});
        let errors = validator(schema).validate(&json!({"n": -1}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].detail, "n in body should be greater than or equal to 0");
        assert_eq!(errors[0].bad_value, json!(-1));
    }

    #[test]
    fn test_to_draft4() {
        let schema = json!({
            "type": "object",
            "x-kubernetes-preserve-unknown-fields": true,
            "properties": {
                "port": {"x-kubernetes-int-or-string": true, "type": "string"},
                "note": {"type": "string", "nullable": true, "format": "password"},
                "when": {"type": "string", "format": "date-time"}
            }
        });

        assert_eq!(
            to_draft4(&schema),
            json!({
                "type": "object",
                "properties": {
                    "port": {},
                    "note": {"type": ["string", "null"]},
                    "when": {"type": "string", "format": "k8s-date-time"}
                }
            })
        );
    }

    #[test]
    fn test_nullable_accepts_null() {
        let schema = json!({"type": "object", "properties": {"note": {"type": "string", "nullable": true}}});
        assert!(validator(schema).validate(&json!({"note": null})).is_empty());
    }
}
