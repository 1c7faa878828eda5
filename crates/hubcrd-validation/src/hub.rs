//! The hub.traefik.io CRD set shipped with the crate

use hubcrd_core::MemoryFileSystem;

use crate::error::Result;
use crate::validator::{Validator, ValidatorConfig};

macro_rules! crd_files {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../crds/", $name)))),*]
    };
}

/// CRD manifests of every hub.traefik.io/v1alpha1 kind
pub const HUB_CRDS: &[(&str, &str)] = crd_files![
    "hub.traefik.io_accesscontrolpolicies.yaml",
    "hub.traefik.io_aiservices.yaml",
    "hub.traefik.io_apiaccesses.yaml",
    "hub.traefik.io_apiauths.yaml",
    "hub.traefik.io_apibundles.yaml",
    "hub.traefik.io_apicatalogitems.yaml",
    "hub.traefik.io_apigateways.yaml",
    "hub.traefik.io_apiplans.yaml",
    "hub.traefik.io_apiportalauths.yaml",
    "hub.traefik.io_apiportals.yaml",
    "hub.traefik.io_apiratelimits.yaml",
    "hub.traefik.io_apis.yaml",
    "hub.traefik.io_apiversions.yaml",
    "hub.traefik.io_managedapplications.yaml",
    "hub.traefik.io_managedsubscriptions.yaml",
    "hub.traefik.io_uplinks.yaml",
];

/// The embedded CRDs as a filesystem the loader can walk
pub fn hub_crds() -> MemoryFileSystem {
    HUB_CRDS
        .iter()
        .fold(MemoryFileSystem::new(), |fs, (name, content)| {
            fs.with_text_file(name, content)
        })
}

/// A validator with every hub CRD registered
pub fn build_hub_validator() -> Result<Validator> {
    build_hub_validator_with(ValidatorConfig::default())
}

pub fn build_hub_validator_with(config: ValidatorConfig) -> Result<Validator> {
    let mut validator = Validator::with_config(config);
    validator.register_all(&hub_crds())?;
    Ok(validator)
}
