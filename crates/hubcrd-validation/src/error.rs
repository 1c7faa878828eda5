//! Validation error types

use hubcrd_core::CoreError;
use thiserror::Error;

/// Errors raised while building a validator
///
/// Validating a document never fails: problems with the document are
/// reported as field errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ValidationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("registering CRD {name:?}")]
    Register {
        name: String,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("obtaining validation schema version {version:?}")]
    SchemaLookup {
        version: String,
        #[source]
        source: CoreError,
    },

    #[error("building structural schema")]
    Structural {
        #[source]
        source: Box<ValidationError>,
    },

    #[error("creating schema validator")]
    SchemaValidator {
        #[source]
        source: Box<ValidationError>,
    },

    #[error("compiling CEL rule {rule:?} at {path}: {message}")]
    CompileRule {
        rule: String,
        path: String,
        message: String,
    },

    #[error("CEL rule {rule:?} at {path} is too expensive: {message}")]
    RuleTooExpensive {
        rule: String,
        path: String,
        message: String,
    },

    #[error("{path}: {message}")]
    InvalidSchema { path: String, message: String },

    #[error("listing CRDs from the cluster")]
    Cluster {
        #[source]
        source: kube::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

impl ValidationError {
    pub(crate) fn invalid_schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidSchema {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubcrd_core::error_chain;

    #[test]
    fn test_register_chain() {
        let err = ValidationError::Register {
            name: "apis.hub.traefik.io".to_string(),
            source: Box::new(ValidationError::Structural {
                source: Box::new(ValidationError::invalid_schema(
                    "openAPIV3Schema.properties[spec]",
                    "$ref is not supported",
                )),
            }),
        };

        assert_eq!(
            error_chain(&err),
            r#"registering CRD "apis.hub.traefik.io": building structural schema: openAPIV3Schema.properties[spec]: $ref is not supported"#
        );
    }
}
