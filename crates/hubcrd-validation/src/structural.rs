//! Structural schemas
//!
//! A structural schema is the typed skeleton of an OpenAPI v3 schema: every
//! node has a single type, and object, array and map shapes are explicit.
//! CEL rules are attached to the node they were declared on.

use std::collections::BTreeMap;

use hubcrd_core::JSONSchemaProps;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::ValidationRule;
use serde_json::{Map, Value};

use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, Default)]
pub struct Structural {
    pub type_: String,
    pub format: String,
    pub nullable: bool,
    pub int_or_string: bool,
    pub preserve_unknown_fields: bool,
    pub embedded_resource: bool,
    pub properties: BTreeMap<String, Structural>,
    pub items: Option<Box<Structural>>,
    /// Schema of map values, set for `additionalProperties: {...}`
    pub additional_properties: Option<Box<Structural>>,
    pub rules: Vec<ValidationRule>,
}

impl Structural {
    pub fn new(props: &JSONSchemaProps) -> Result<Self> {
        let schema = serde_json::to_value(props)?;
        Self::from_value(&schema, "openAPIV3Schema")
    }

    pub fn from_value(schema: &Value, path: &str) -> Result<Self> {
        let Some(schema) = schema.as_object() else {
            return Err(ValidationError::invalid_schema(path, "must be an object"));
        };

        if schema.contains_key("$ref") {
            return Err(ValidationError::invalid_schema(path, "$ref is not supported"));
        }

        let mut node = Structural {
            type_: string(schema, "type"),
            format: string(schema, "format"),
            nullable: flag(schema, "nullable"),
            int_or_string: flag(schema, "x-kubernetes-int-or-string"),
            preserve_unknown_fields: flag(schema, "x-kubernetes-preserve-unknown-fields"),
            embedded_resource: flag(schema, "x-kubernetes-embedded-resource"),
            ..Default::default()
        };

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, sub) in properties {
                let sub_path = format!("{path}.properties[{name}]");
                node.properties
                    .insert(name.clone(), Structural::from_value(sub, &sub_path)?);
            }
        }

        match schema.get("items") {
            None | Some(Value::Null) => {}
            Some(Value::Array(_)) => {
                return Err(ValidationError::invalid_schema(
                    format!("{path}.items"),
                    "items must be a schema object and not an array",
                ));
            }
            Some(items) => {
                let items = Structural::from_value(items, &format!("{path}.items"))?;
                node.items = Some(Box::new(items));
            }
        }

        if let Some(additional @ Value::Object(_)) = schema.get("additionalProperties") {
            if !node.properties.is_empty() {
                return Err(ValidationError::invalid_schema(
                    path,
                    "additionalProperties and properties are mutual exclusive",
                ));
            }
            let additional =
                Structural::from_value(additional, &format!("{path}.additionalProperties"))?;
            node.additional_properties = Some(Box::new(additional));
        }

        if let Some(rules) = schema.get("x-kubernetes-validations") {
            let rules: Vec<ValidationRule> = serde_json::from_value(rules.clone())?;
            for (i, rule) in rules.iter().enumerate() {
                if rule.rule.trim().is_empty() {
                    return Err(ValidationError::invalid_schema(
                        format!("{path}.x-kubernetes-validations[{i}].rule"),
                        "rule must not be empty",
                    ));
                }
            }
            node.rules = rules;
        }

        Ok(node)
    }

    /// Whether this node or any node below it carries CEL rules
    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
            || self.properties.values().any(Structural::has_rules)
            || self.items.as_deref().is_some_and(Structural::has_rules)
            || self
                .additional_properties
                .as_deref()
                .is_some_and(Structural::has_rules)
    }
}

fn string(schema: &Map<String, Value>, key: &str) -> String {
    schema
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn flag(schema: &Map<String, Value>, key: &str) -> bool {
    schema.get(key).and_then(Value::as_bool).unwrap_or(false)
}
