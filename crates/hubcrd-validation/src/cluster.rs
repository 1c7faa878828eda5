//! CRDs installed in a live cluster

use hubcrd_core::CustomResourceDefinition;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1 as apiextensions_v1;
use kube::api::{Api, ListParams};
use tracing::{debug, info};

use crate::error::{Result, ValidationError};
use crate::validator::Validator;

/// List the CRDs of the cluster `client` points to
pub async fn fetch_crds(client: kube::Client) -> Result<Vec<CustomResourceDefinition>> {
    let api: Api<apiextensions_v1::CustomResourceDefinition> = Api::all(client);
    let list = api
        .list(&ListParams::default())
        .await
        .map_err(|source| ValidationError::Cluster { source })?;

    let mut crds = Vec::with_capacity(list.items.len());
    for crd in list.items {
        let crd = CustomResourceDefinition::try_from(crd)?;
        debug!(name = %crd.name, "fetched CRD");
        crds.push(crd);
    }
    info!(count = crds.len(), "fetched CRDs from the cluster");
    Ok(crds)
}

/// Register the CRDs of the cluster selected by the current kubeconfig context
pub async fn register_from_cluster(validator: &mut Validator) -> Result<Vec<CustomResourceDefinition>> {
    let client = kube::Client::try_default()
        .await
        .map_err(|source| ValidationError::Cluster { source })?;

    let crds = fetch_crds(client).await?;
    for crd in &crds {
        validator.register(crd).map_err(|e| ValidationError::Register {
            name: crd.name.clone(),
            source: Box::new(e),
        })?;
    }
    Ok(crds)
}
