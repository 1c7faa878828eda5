//! Kinds command - list the kinds the validator knows

use console::style;
use miette::IntoDiagnostic;
use serde_json::json;

use crate::error::Result;
use crate::registry::{Registry, RegistryOptions};

pub async fn run(options: &RegistryOptions, json_output: bool) -> Result<()> {
    let registry = Registry::build(options).await?;
    let kinds = registry.validator.kinds();

    if json_output {
        let output: Vec<_> = kinds
            .iter()
            .map(|gvk| {
                json!({
                    "group": gvk.group,
                    "version": gvk.version,
                    "kind": gvk.kind,
                    "namespaced": registry.validator.is_namespaced(gvk).unwrap_or_default(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        return Ok(());
    }

    for gvk in &kinds {
        let scope = match registry.validator.is_namespaced(gvk) {
            Some(true) => "Namespaced",
            _ => "Cluster",
        };
        println!(
            "{:<24} {:<32} {}",
            style(&gvk.kind).cyan(),
            gvk.api_version(),
            style(scope).dim()
        );
    }
    Ok(())
}
