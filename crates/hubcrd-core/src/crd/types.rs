//! Version-independent CustomResourceDefinition model
//!
//! Both `apiextensions.k8s.io/v1` and `v1beta1` manifests are converted to
//! these types, so the rest of the pipeline deals with a single shape.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;

#[derive(Debug, Clone, PartialEq)]
pub struct CustomResourceDefinition {
    pub name: String,
    pub spec: CustomResourceDefinitionSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomResourceDefinitionSpec {
    pub group: String,
    pub names: CustomResourceDefinitionNames,
    pub scope: ResourceScope,
    /// Schema shared by every version, only found in `v1beta1` manifests
    pub validation: Option<CustomResourceValidation>,
    pub versions: Vec<CustomResourceDefinitionVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResourceDefinitionNames {
    pub kind: String,
    #[serde(default)]
    pub plural: String,
    #[serde(default)]
    pub singular: String,
    #[serde(default)]
    pub list_kind: String,
    #[serde(default)]
    pub short_names: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceScope {
    #[default]
    Namespaced,
    Cluster,
}

impl ResourceScope {
    pub fn parse(scope: &str) -> Option<Self> {
        match scope {
            "" | "Namespaced" => Some(Self::Namespaced),
            "Cluster" => Some(Self::Cluster),
            _ => None,
        }
    }

    pub fn is_namespaced(&self) -> bool {
        matches!(self, Self::Namespaced)
    }
}

impl fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Namespaced => write!(f, "Namespaced"),
            Self::Cluster => write!(f, "Cluster"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomResourceDefinitionVersion {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    pub deprecated: bool,
    pub schema: Option<CustomResourceValidation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomResourceValidation {
    #[serde(rename = "openAPIV3Schema", default, skip_serializing_if = "Option::is_none")]
    pub open_api_v3_schema: Option<JSONSchemaProps>,
}

impl CustomResourceDefinition {
    pub fn kind(&self) -> &str {
        &self.spec.names.kind
    }

    pub fn is_namespaced(&self) -> bool {
        self.spec.scope.is_namespaced()
    }
}
