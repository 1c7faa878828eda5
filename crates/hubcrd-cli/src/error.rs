//! CLI error types with exit code handling
//!
//! Library errors are flattened into messages here, keeping their whole
//! source chain, and each variant maps to one exit code.

use std::path::Path;

use hubcrd_core::{CoreError, error_chain};
use hubcrd_validation::ValidationError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Documents were decoded but some of them are invalid
    #[error("Validation failed with {errors} error(s) in {documents} document(s)")]
    #[diagnostic(code(hubcrd::cli::validation))]
    ValidationFailed { errors: usize, documents: usize },

    /// A CRD could not be loaded or registered
    #[error("CRD error: {message}")]
    #[diagnostic(code(hubcrd::cli::crd))]
    Crd {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A manifest tree could not be loaded
    #[error("Manifest error: {message}")]
    #[diagnostic(code(hubcrd::cli::manifest))]
    Manifest { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(hubcrd::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(hubcrd::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ValidationFailed { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Crd { .. } => exit_codes::ERROR,
            CliError::Manifest { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn validation_failed(errors: usize, documents: usize) -> Self {
        Self::ValidationFailed { errors, documents }
    }

    /// A registration failure for the CRDs found under `source`
    pub fn crd(source: &str, err: &ValidationError) -> Self {
        let help = match err {
            ValidationError::Cluster { .. } => {
                Some("check that the current kube context points to a reachable cluster".to_string())
            }
            _ => None,
        };
        Self::Crd {
            message: format!("{source}: {}", error_chain(err)),
            help,
        }
    }

    /// A loading failure of the manifests under `path`
    ///
    /// Missing or unreadable files are IO errors, anything else is a
    /// manifest error.
    pub fn manifest(path: &Path, err: &CoreError) -> Self {
        let message = format!("{}: {}", path.display(), error_chain(err));
        match err {
            CoreError::NotFound { .. } | CoreError::OpenFile { .. } | CoreError::Walk { .. } => {
                Self::Io { message }
            }
            _ => Self::Manifest { message },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<miette::Report> for CliError {
    fn from(err: miette::Report) -> Self {
        CliError::Other {
            message: format!("{:?}", err),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
