//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("walking {path}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    #[error("opening file {path}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("reading file content of {path}")]
    ReadContent {
        path: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("invalid Yaml document separator: {0}")]
    InvalidSeparator(String),

    #[error("Object 'Kind' is missing in '{0}'")]
    MissingKind(String),

    #[error("no kind {kind:?} is registered for version {version:?}")]
    NotRegistered { kind: String, version: String },

    #[error("{0}")]
    Malformed(String),

    #[error("decoding object")]
    DecodeObject {
        #[source]
        source: Box<CoreError>,
    },

    #[error("converting CRD to internal object")]
    Conversion {
        #[source]
        source: Box<CoreError>,
    },

    #[error("decoding manifest {path}")]
    Manifest {
        path: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("loading CRD documents")]
    LoadManifests {
        #[source]
        source: Box<CoreError>,
    },

    #[error("strict decoding error: {}", unknown_fields(.0))]
    UnknownFields(Vec<String>),

    #[error("decoding")]
    Decode {
        #[source]
        source: Box<CoreError>,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

fn unknown_fields(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| format!("unknown field {field:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an error and its sources as `outer: inner: root`
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain() {
        let err = CoreError::Manifest {
            path: "crds/api.yaml".to_string(),
            source: Box::new(CoreError::DecodeObject {
                source: Box::new(CoreError::MissingKind("{}".to_string())),
            }),
        };
        assert_eq!(
            error_chain(&err),
            "decoding manifest crds/api.yaml: decoding object: Object 'Kind' is missing in '{}'"
        );
    }

    #[test]
    fn test_unknown_fields_message() {
        let err = CoreError::UnknownFields(vec!["spec.titel".to_string(), "spec.x[0].y".to_string()]);
        assert_eq!(
            err.to_string(),
            r#"strict decoding error: unknown field "spec.titel", unknown field "spec.x[0].y""#
        );
    }
}
