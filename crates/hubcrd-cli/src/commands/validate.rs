//! Validate command - check manifests against the registered CRDs

use std::path::{Path, PathBuf};

use console::style;
use hubcrd_core::{DiskFileSystem, error_chain, load_manifests};
use miette::IntoDiagnostic;
use tracing::debug;

use crate::display::{ValidationReport, pluralize};
use crate::error::{CliError, Result};
use crate::registry::{Registry, RegistryOptions};

pub async fn run(paths: &[PathBuf], options: &RegistryOptions, json_output: bool) -> Result<()> {
    let registry = Registry::build(options).await?;

    if !json_output {
        println!(
            "{} Validating {} against {}",
            style("→").blue(),
            pluralize(paths.len(), "path", "paths"),
            pluralize(registry.validator.kinds().len(), "kind", "kinds")
        );
    }

    let mut report = ValidationReport::new();
    for path in paths {
        validate_path(&registry, path, &mut report)?;
    }

    if json_output {
        let output = serde_json::to_string_pretty(&report.to_json()).into_diagnostic()?;
        println!("{output}");
    } else {
        report.display();
        println!();
        report.print_summary();
    }

    let (errors, _) = report.summary();
    if errors > 0 {
        return Err(CliError::validation_failed(errors, report.documents));
    }
    Ok(())
}

fn validate_path(registry: &Registry, path: &Path, report: &mut ValidationReport) -> Result<()> {
    let fs = DiskFileSystem::new(path).map_err(|e| CliError::manifest(path, &e))?;
    let manifests = load_manifests(&fs).map_err(|e| CliError::manifest(path, &e))?;

    for manifest in &manifests {
        let file = display_path(path, &manifest.path);
        match registry.decoder.decode_checked(&manifest.data, &registry.validator) {
            Ok(Some(object)) => {
                report.documents += 1;
                let errors = registry.validator.validate(&object);
                debug!(file = %file, kind = object.kind(), name = object.name(), errors = errors.len(), "validated");
                for error in &errors {
                    report.add_field_error(&file, object.kind(), object.name(), error);
                }
            }
            Ok(None) => {
                if let Some(unknown) = registry.unknown_kind(&manifest.data) {
                    report.add_unknown_kind(&file, &unknown.kind, unknown.suggestion.as_deref());
                }
            }
            Err(err) => report.add_decode_error(&file, &error_chain(&err)),
        }
    }
    Ok(())
}

/// The file a manifest came from, as the user named it
fn display_path(root: &Path, relative: &str) -> String {
    if root.is_file() {
        root.display().to_string()
    } else {
        root.join(relative).display().to_string()
    }
}
