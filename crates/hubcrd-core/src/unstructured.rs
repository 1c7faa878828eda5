//! Schema-less Kubernetes objects

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::gvk::GroupVersionKind;

/// A decoded manifest kept as a generic JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unstructured {
    content: Map<String, Value>,
}

impl Unstructured {
    pub fn new(content: Map<String, Value>) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    pub fn into_content(self) -> Map<String, Value> {
        self.content
    }

    pub fn api_version(&self) -> &str {
        self.content
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.content
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(self.api_version(), self.kind())
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.content.get("metadata")
    }

    /// A string field of `metadata`, empty when absent
    pub fn metadata_str(&self, field: &str) -> &str {
        self.metadata()
            .and_then(|m| m.get(field))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.metadata_str("name")
    }

    pub fn namespace(&self) -> &str {
        self.metadata_str("namespace")
    }
}

impl From<Map<String, Value>> for Unstructured {
    fn from(content: Map<String, Value>) -> Self {
        Self::new(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let Value::Object(content) = json!({
            "apiVersion": "hub.traefik.io/v1alpha1",
            "kind": "APIRateLimit",
            "metadata": {"name": "limit", "namespace": "apps"},
            "spec": {"limit": 10},
        }) else {
            unreachable!()
        };
        let object = Unstructured::new(content);

        assert_eq!(object.kind(), "APIRateLimit");
        assert_eq!(object.name(), "limit");
        assert_eq!(object.namespace(), "apps");
        assert_eq!(object.gvk().to_string(), "hub.traefik.io/v1alpha1, Kind=APIRateLimit");
    }

    #[test]
    fn test_missing_fields() {
        let object = Unstructured::default();
        assert_eq!(object.kind(), "");
        assert_eq!(object.name(), "");
        assert!(object.metadata().is_none());
    }
}
