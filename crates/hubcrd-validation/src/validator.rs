//! The validator registry

use std::collections::HashMap;

use hubcrd_core::{
    CustomResourceDefinition, ErrorList, FileSystem, GroupVersionKind, KnownFields, Unstructured,
    get_crds,
};
use tracing::{debug, warn};

use crate::cel::CelValidator;
use crate::error::{Result, ValidationError};
use crate::metadata::{NameRule, validate_object_meta};
use crate::openapi::SchemaValidator;
use crate::pruning::unknown_fields;
use crate::structural::Structural;

/// Validator settings
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub name_rule: NameRule,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            name_rule: NameRule::DnsLabel,
        }
    }
}

impl ValidatorConfig {
    pub fn name_rule(mut self, rule: NameRule) -> Self {
        self.name_rule = rule;
        self
    }
}

/// Everything needed to validate one group/version/kind
#[derive(Debug)]
struct RegisteredKind {
    gvk: GroupVersionKind,
    namespaced: bool,
    structural: Option<Structural>,
    schema: Option<SchemaValidator>,
    cel: Option<CelValidator>,
}

/// Validates custom resources against the CRDs registered with it
///
/// Build it with [`Validator::register`] calls, then share it read-only.
#[derive(Debug, Default)]
pub struct Validator {
    config: ValidatorConfig,
    kinds: HashMap<String, RegisteredKind>,
}

impl Validator {
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self {
            config,
            kinds: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Register every version of `crd`
    ///
    /// Registering a kind again replaces the previous entry.
    pub fn register(&mut self, crd: &CustomResourceDefinition) -> Result<()> {
        for version in &crd.spec.versions {
            let gvk = GroupVersionKind::new(&crd.spec.group, &version.name, crd.kind());

            let validation = crd.schema_for_version(&version.name).map_err(|source| {
                ValidationError::SchemaLookup {
                    version: version.name.clone(),
                    source,
                }
            })?;

            let (structural, schema, cel) = match validation.and_then(|v| v.open_api_v3_schema.as_ref()) {
                Some(props) => {
                    let raw = serde_json::to_value(props)?;
                    let structural = Structural::from_value(&raw, "openAPIV3Schema").map_err(|e| {
                        ValidationError::Structural {
                            source: Box::new(e),
                        }
                    })?;
                    let schema = SchemaValidator::new(props).map_err(|e| {
                        ValidationError::SchemaValidator {
                            source: Box::new(e),
                        }
                    })?;
                    let cel = CelValidator::new(&structural, &raw)?;
                    (Some(structural), Some(schema), cel)
                }
                None => {
                    warn!(gvk = %gvk, "CRD version has no validation schema");
                    (None, None, None)
                }
            };

            debug!(gvk = %gvk, rules = cel.is_some(), "registered kind");
            self.kinds.insert(
                gvk.to_string(),
                RegisteredKind {
                    gvk,
                    namespaced: crd.is_namespaced(),
                    structural,
                    schema,
                    cel,
                },
            );
        }
        Ok(())
    }

    /// Decode and register every CRD found in `fs`
    ///
    /// Returns the registered CRDs so callers can teach their decoders
    /// about the new kinds.
    pub fn register_all(&mut self, fs: &dyn FileSystem) -> Result<Vec<CustomResourceDefinition>> {
        let crds = get_crds(fs)?;
        for crd in &crds {
            self.register(crd).map_err(|e| ValidationError::Register {
                name: crd.name.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(crds)
    }

    /// Validate a decoded object
    ///
    /// Metadata errors come first, then schema errors, then CEL rule
    /// failures. Objects of unregistered kinds have no errors.
    pub fn validate(&self, object: &Unstructured) -> ErrorList {
        let Some(kind) = self.kinds.get(&object.gvk().to_string()) else {
            return ErrorList::new();
        };

        let mut errors = validate_object_meta(object.metadata(), kind.namespaced, self.config.name_rule);

        let document = serde_json::Value::Object(object.content().clone());
        if let Some(schema) = &kind.schema {
            errors.extend(schema.validate(&document));
        }
        if let Some(cel) = &kind.cel {
            errors.extend(cel.validate(&document));
        }

        errors
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&GroupVersionKind> {
        let mut kinds: Vec<&GroupVersionKind> = self.kinds.values().map(|k| &k.gvk).collect();
        kinds.sort();
        kinds
    }

    pub fn is_registered(&self, gvk: &GroupVersionKind) -> bool {
        self.kinds.contains_key(&gvk.to_string())
    }

    /// Whether a registered kind is namespaced
    pub fn is_namespaced(&self, gvk: &GroupVersionKind) -> Option<bool> {
        self.kinds.get(&gvk.to_string()).map(|k| k.namespaced)
    }
}

impl KnownFields for Validator {
    /// Fields the object's schema does not declare; none for unregistered kinds
    fn unknown_fields(&self, object: &Unstructured) -> Vec<String> {
        self.kinds
            .get(&object.gvk().to_string())
            .and_then(|kind| kind.structural.as_ref())
            .map(|schema| unknown_fields(schema, &serde_json::Value::Object(object.content().clone())))
            .unwrap_or_default()
    }
}
