//! CustomResourceDefinition model, decoding and loading

mod decoder;
mod types;

pub use decoder::CrdDecoder;
pub use types::*;

use crate::error::{CoreError, Result};
use crate::files::FileSystem;
use crate::loader::load_manifests;

impl CustomResourceDefinition {
    /// The validation schema of `version`
    ///
    /// Per-version schemas take precedence. A CRD without any falls back to
    /// its top-level schema; defining both is malformed.
    pub fn schema_for_version(&self, version: &str) -> Result<Option<&CustomResourceValidation>> {
        let per_version = self.spec.versions.iter().any(|v| v.schema.is_some());
        if !per_version {
            return Ok(self.spec.validation.as_ref());
        }

        if self.spec.validation.is_some() {
            return Err(CoreError::Malformed(format!(
                "malformed CustomResourceDefinition {} version {version}: top-level and per-version schemas must be mutual exclusive",
                self.name
            )));
        }

        self.spec
            .versions
            .iter()
            .find(|v| v.name == version)
            .map(|v| v.schema.as_ref())
            .ok_or_else(|| {
                CoreError::Malformed(format!(
                    "version {version} not found in CustomResourceDefinition: {}",
                    self.name
                ))
            })
    }
}

/// Decode every CRD found in `fs`
///
/// Any failure aborts the whole load.
pub fn get_crds(fs: &dyn FileSystem) -> Result<Vec<CustomResourceDefinition>> {
    let decoder = CrdDecoder::new();

    let manifests = load_manifests(fs).map_err(|e| CoreError::LoadManifests {
        source: Box::new(e),
    })?;

    manifests
        .iter()
        .map(|manifest| {
            decoder
                .decode(&manifest.data)
                .map_err(|e| CoreError::Manifest {
                    path: manifest.path.clone(),
                    source: Box::new(e),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MemoryFileSystem;

    fn crd(validation: bool, per_version: bool) -> CustomResourceDefinition {
        let schema = CustomResourceValidation {
            open_api_v3_schema: Some(JSONSchemaProps {
                type_: Some("object".to_string()),
                ..Default::default()
            }),
        };
        CustomResourceDefinition {
            name: "things.example.com".to_string(),
            spec: CustomResourceDefinitionSpec {
                group: "example.com".to_string(),
                names: CustomResourceDefinitionNames {
                    kind: "Thing".to_string(),
                    ..Default::default()
                },
                scope: ResourceScope::Namespaced,
                validation: validation.then(|| schema.clone()),
                versions: vec![CustomResourceDefinitionVersion {
                    name: "v1".to_string(),
                    served: true,
                    storage: true,
                    deprecated: false,
                    schema: per_version.then_some(schema),
                }],
            },
        }
    }

    #[test]
    fn test_schema_for_version() {
        assert!(crd(false, true).schema_for_version("v1").unwrap().is_some());
        assert!(crd(true, false).schema_for_version("v1").unwrap().is_some());
        assert!(crd(false, false).schema_for_version("v1").unwrap().is_none());
    }

    #[test]
    fn test_schema_for_version_errors() {
        let err = crd(true, true).schema_for_version("v1").unwrap_err();
        assert!(err.to_string().contains("must be mutual exclusive"));

        let err = crd(false, true).schema_for_version("v2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "version v2 not found in CustomResourceDefinition: things.example.com"
        );
    }

    #[test]
    fn test_get_crds_wraps_errors() {
        let fs = MemoryFileSystem::new().with_text_file("broken.yaml", "kind: Nope\napiVersion: v1\n");
        let err = get_crds(&fs).unwrap_err();
        assert!(matches!(err, CoreError::Manifest { ref path, .. } if path == "broken.yaml"));
    }
}
