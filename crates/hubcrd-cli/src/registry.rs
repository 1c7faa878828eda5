//! The validator and decoder a command works with

use std::path::PathBuf;

use hubcrd_core::gvk::type_meta;
use hubcrd_core::{DiskFileSystem, GroupVersionKind, HubDecoder, Scheme};
use hubcrd_validation::{Validator, build_hub_validator, register_from_cluster};
use tracing::{debug, info};

use crate::error::{CliError, Result};
use crate::suggestions::closest_match;

/// Where CRDs come from
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    /// Extra CRD files or directories
    pub crds: Vec<PathBuf>,
    /// Skip the embedded hub.traefik.io CRDs
    pub no_embedded: bool,
    /// Also register the CRDs of the current kube context
    pub from_cluster: bool,
}

/// A validator with a decoder that knows the same kinds
pub struct Registry {
    pub validator: Validator,
    pub decoder: HubDecoder,
}

/// A document whose group is known but whose kind is not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind {
    pub kind: String,
    pub suggestion: Option<String>,
}

impl Registry {
    pub async fn build(options: &RegistryOptions) -> Result<Self> {
        let (mut validator, mut scheme) = if options.no_embedded {
            (Validator::new(), Scheme::new())
        } else {
            let validator = build_hub_validator().map_err(|e| CliError::crd("embedded CRDs", &e))?;
            (validator, Scheme::hub())
        };

        for path in &options.crds {
            let fs = DiskFileSystem::new(path).map_err(|e| CliError::manifest(path, &e))?;
            let source = path.display().to_string();
            let crds = validator
                .register_all(&fs)
                .map_err(|e| CliError::crd(&source, &e))?;
            info!(path = %source, count = crds.len(), "registered CRDs");
            for crd in &crds {
                scheme.add_crd(crd);
            }
        }

        if options.from_cluster {
            let crds = register_from_cluster(&mut validator)
                .await
                .map_err(|e| CliError::crd("cluster", &e))?;
            for crd in &crds {
                scheme.add_crd(crd);
            }
        }

        debug!(kinds = validator.kinds().len(), "validator ready");
        Ok(Self {
            validator,
            decoder: HubDecoder::with_scheme(scheme),
        })
    }

    /// Detect a document of a registered group whose kind is unknown
    ///
    /// Unparsable documents and foreign groups are not reported.
    pub fn unknown_kind(&self, document: &[u8]) -> Option<UnknownKind> {
        let value: serde_json::Value = serde_yaml::from_slice(document).ok()?;
        let (api_version, kind) = type_meta(&value);
        if kind.is_empty() {
            return None;
        }

        let gvk = GroupVersionKind::from_api_version(api_version, kind);
        let scheme = self.decoder.scheme();
        if !scheme.has_group(&gvk.group) || scheme.recognizes(&gvk) {
            return None;
        }

        let mut candidates: Vec<&str> = scheme
            .known_kinds()
            .filter(|known| known.group == gvk.group)
            .map(|known| known.kind.as_str())
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        Some(UnknownKind {
            kind: gvk.kind.clone(),
            suggestion: closest_match(&gvk.kind, &candidates).map(str::to_string),
        })
    }
}
