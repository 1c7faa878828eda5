//! Decoding of hub.traefik.io resources into unstructured objects

use serde_json::Value;
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::gvk::{GroupVersionKind, type_meta};
use crate::scheme::Scheme;
use crate::unstructured::Unstructured;

/// Reports the fields of an object that its kind does not declare
pub trait KnownFields {
    /// Rendered paths of undeclared fields, e.g. `spec.titel`
    fn unknown_fields(&self, object: &Unstructured) -> Vec<String>;
}

/// Decodes manifests of the kinds registered in its [`Scheme`]
#[derive(Debug, Clone)]
pub struct HubDecoder {
    scheme: Scheme,
}

impl Default for HubDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HubDecoder {
    /// A decoder for the hub.traefik.io/v1alpha1 kinds
    pub fn new() -> Self {
        Self::with_scheme(Scheme::hub())
    }

    pub fn with_scheme(scheme: Scheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Decode a single document
    ///
    /// Returns `Ok(None)` when the document has no kind or a kind the
    /// scheme does not know: such documents are simply not of interest.
    /// Syntax errors, duplicate keys and non-object documents are errors.
    pub fn decode(&self, document: &[u8]) -> Result<Option<Unstructured>> {
        self.decode_strict(document)
            .map_err(|e| CoreError::Decode {
                source: Box::new(e),
            })
    }

    /// Decode a single document, rejecting fields `known` does not declare
    pub fn decode_checked(
        &self,
        document: &[u8],
        known: &dyn KnownFields,
    ) -> Result<Option<Unstructured>> {
        let Some(object) = self.decode(document)? else {
            return Ok(None);
        };

        let unknown = known.unknown_fields(&object);
        if !unknown.is_empty() {
            return Err(CoreError::Decode {
                source: Box::new(CoreError::UnknownFields(unknown)),
            });
        }
        Ok(Some(object))
    }

    fn decode_strict(&self, document: &[u8]) -> Result<Option<Unstructured>> {
        // Mappings reject duplicate keys only when read as YAML values
        let _: serde_yaml::Value = serde_yaml::from_slice(document)?;

        let value: Value = serde_yaml::from_slice(document)?;

        let Some(content) = value.as_object() else {
            return Err(CoreError::Malformed(format!(
                "expected an object, got {}",
                json_type(&value)
            )));
        };

        for field in ["apiVersion", "kind"] {
            if let Some(v) = content.get(field).filter(|v| !v.is_string()) {
                return Err(CoreError::Malformed(format!(
                    "{field} must be a string, got {}",
                    json_type(v)
                )));
            }
        }

        let (api_version, kind) = type_meta(&value);
        if kind.is_empty() {
            trace!("skipping document without kind");
            return Ok(None);
        }

        let gvk = GroupVersionKind::from_api_version(api_version, kind);
        if !self.scheme.recognizes(&gvk) {
            trace!(gvk = %gvk, "skipping unregistered kind");
            return Ok(None);
        }

        let Value::Object(content) = value else {
            return Ok(None);
        };
        Ok(Some(Unstructured::new(content)))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
