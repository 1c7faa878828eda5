//! CustomResourceDefinition decoding
//!
//! Decoding happens in two steps, mirroring the apiextensions machinery:
//! the document is first read as the versioned type named by its
//! `apiVersion`, then converted to the internal [`CustomResourceDefinition`].

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1 as apiextensions_v1;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::*;
use crate::error::{CoreError, Result};
use crate::gvk::{GroupVersionKind, type_meta};
use crate::scheme::Scheme;

/// Decodes CRD manifests of any supported apiextensions version
#[derive(Debug, Clone)]
pub struct CrdDecoder {
    scheme: Scheme,
}

impl Default for CrdDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded CRD in its original API version
enum Versioned {
    V1(Box<apiextensions_v1::CustomResourceDefinition>),
    V1Beta1(Box<V1Beta1CustomResourceDefinition>),
}

impl CrdDecoder {
    pub fn new() -> Self {
        Self {
            scheme: Scheme::apiextensions(),
        }
    }

    pub fn decode(&self, document: &[u8]) -> Result<CustomResourceDefinition> {
        let versioned = self
            .decode_versioned(document)
            .map_err(|e| CoreError::DecodeObject {
                source: Box::new(e),
            })?;

        let crd = match versioned {
            Versioned::V1(crd) => CustomResourceDefinition::try_from(*crd),
            Versioned::V1Beta1(crd) => CustomResourceDefinition::try_from(*crd),
        }
        .map_err(|e| CoreError::Conversion {
            source: Box::new(e),
        })?;

        debug!(name = %crd.name, kind = %crd.kind(), "decoded CRD");
        Ok(crd)
    }

    fn decode_versioned(&self, document: &[u8]) -> Result<Versioned> {
        let value: Value = serde_yaml::from_slice(document)?;

        let (api_version, kind) = type_meta(&value);
        if kind.is_empty() {
            return Err(CoreError::MissingKind(
                String::from_utf8_lossy(document).trim().to_string(),
            ));
        }

        let gvk = GroupVersionKind::from_api_version(api_version, kind);
        if !self.scheme.recognizes(&gvk) {
            return Err(CoreError::NotRegistered {
                kind: kind.to_string(),
                version: api_version.to_string(),
            });
        }

        Ok(match gvk.version.as_str() {
            "v1" => Versioned::V1(Box::new(serde_json::from_value(value)?)),
            _ => Versioned::V1Beta1(Box::new(serde_json::from_value(value)?)),
        })
    }
}

impl TryFrom<apiextensions_v1::CustomResourceDefinition> for CustomResourceDefinition {
    type Error = CoreError;

    fn try_from(crd: apiextensions_v1::CustomResourceDefinition) -> Result<Self> {
        let name = crd.metadata.name.unwrap_or_default();
        let spec = crd.spec;

        let names = CustomResourceDefinitionNames {
            kind: spec.names.kind,
            plural: spec.names.plural,
            singular: spec.names.singular.unwrap_or_default(),
            list_kind: spec.names.list_kind.unwrap_or_default(),
            short_names: spec.names.short_names.unwrap_or_default(),
            categories: spec.names.categories.unwrap_or_default(),
        };

        let versions = spec
            .versions
            .into_iter()
            .map(|v| CustomResourceDefinitionVersion {
                name: v.name,
                served: v.served,
                storage: v.storage,
                deprecated: v.deprecated.unwrap_or(false),
                schema: v.schema.map(|s| CustomResourceValidation {
                    open_api_v3_schema: s.open_api_v3_schema,
                }),
            })
            .collect();

        build(name, spec.group, names, &spec.scope, None, versions)
    }
}

#[derive(Debug, Deserialize)]
struct V1Beta1CustomResourceDefinition {
    #[serde(default)]
    metadata: V1Beta1Metadata,
    spec: V1Beta1Spec,
}

#[derive(Debug, Default, Deserialize)]
struct V1Beta1Metadata {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Beta1Spec {
    group: String,
    names: CustomResourceDefinitionNames,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    versions: Vec<V1Beta1Version>,
    #[serde(default)]
    validation: Option<CustomResourceValidation>,
}

#[derive(Debug, Deserialize)]
struct V1Beta1Version {
    name: String,
    #[serde(default = "default_true")]
    served: bool,
    #[serde(default)]
    storage: bool,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    schema: Option<CustomResourceValidation>,
}

fn default_true() -> bool {
    true
}

impl TryFrom<V1Beta1CustomResourceDefinition> for CustomResourceDefinition {
    type Error = CoreError;

    fn try_from(crd: V1Beta1CustomResourceDefinition) -> Result<Self> {
        let spec = crd.spec;

        let mut versions: Vec<CustomResourceDefinitionVersion> = spec
            .versions
            .into_iter()
            .map(|v| CustomResourceDefinitionVersion {
                name: v.name,
                served: v.served,
                storage: v.storage,
                deprecated: v.deprecated,
                schema: v.schema,
            })
            .collect();

        // The single `version` field predates the `versions` list
        if versions.is_empty() {
            if let Some(version) = spec.version.filter(|v| !v.is_empty()) {
                versions.push(CustomResourceDefinitionVersion {
                    name: version,
                    served: true,
                    storage: true,
                    deprecated: false,
                    schema: None,
                });
            }
        }

        build(
            crd.metadata.name,
            spec.group,
            spec.names,
            &spec.scope,
            spec.validation,
            versions,
        )
    }
}

fn build(
    name: String,
    group: String,
    mut names: CustomResourceDefinitionNames,
    scope: &str,
    validation: Option<CustomResourceValidation>,
    versions: Vec<CustomResourceDefinitionVersion>,
) -> Result<CustomResourceDefinition> {
    let scope = ResourceScope::parse(scope)
        .ok_or_else(|| CoreError::Malformed(format!("unknown scope {scope:?} in CRD {name}")))?;

    if versions.is_empty() {
        return Err(CoreError::Malformed(format!("CRD {name} defines no versions")));
    }

    if names.list_kind.is_empty() {
        names.list_kind = format!("{}List", names.kind);
    }

    Ok(CustomResourceDefinition {
        name,
        spec: CustomResourceDefinitionSpec {
            group,
            names,
            scope,
            validation,
            versions,
        },
    })
}
