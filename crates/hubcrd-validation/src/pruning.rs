//! Detection of fields a structural schema does not declare
//!
//! The API server prunes these silently; decoding manifests strictly turns
//! them into errors instead, which catches misspelled field names.

use hubcrd_core::Path;
use serde_json::{Map, Value};

use crate::structural::Structural;

/// Fields every object carries without declaring them
const TYPE_META_FIELDS: [&str; 3] = ["apiVersion", "kind", "metadata"];

/// Rendered paths of the fields in `document` that `schema` does not declare
///
/// Fields under `x-kubernetes-preserve-unknown-fields` nodes and free-form
/// objects (no `properties`) are accepted as is. Object metadata is left to
/// metadata validation.
pub fn unknown_fields(schema: &Structural, document: &Value) -> Vec<String> {
    let mut unknown = Vec::new();
    if let Value::Object(fields) = document {
        visit_object(schema, fields, &Path::root(), true, &mut unknown);
    }
    unknown
}

fn visit(schema: &Structural, value: &Value, path: &Path, unknown: &mut Vec<String>) {
    match value {
        Value::Object(fields) => {
            if let Some(additional) = &schema.additional_properties {
                for (key, value) in fields {
                    visit(additional, value, &path.key(key), unknown);
                }
            } else {
                visit_object(schema, fields, path, schema.embedded_resource, unknown);
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = &schema.items {
                for (i, item) in items.iter().enumerate() {
                    visit(item_schema, item, &path.index(i), unknown);
                }
            }
        }
        _ => {}
    }
}

fn visit_object(
    schema: &Structural,
    fields: &Map<String, Value>,
    path: &Path,
    type_meta: bool,
    unknown: &mut Vec<String>,
) {
    for (name, value) in fields {
        if type_meta && TYPE_META_FIELDS.contains(&name.as_str()) {
            continue;
        }
        match schema.properties.get(name) {
            Some(property) => visit(property, value, &path.child(name), unknown),
            None if schema.preserve_unknown_fields || schema.properties.is_empty() => {}
            None => unknown.push(path.child(name).to_string()),
        }
    }
}
