//! Group, version and kind identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a resource type. Its display form, `group/version, Kind=kind`,
/// is the key validators are registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Build from a manifest's `apiVersion` and `kind`
    ///
    /// An `apiVersion` without a slash is a version of the core group.
    /// One with more than one slash cannot be parsed and only the kind is
    /// kept.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        match api_version.split_once('/') {
            None => Self::new("", api_version, kind),
            Some((group, version)) if !version.contains('/') => Self::new(group, version, kind),
            Some(_) => Self::new("", "", kind),
        }
    }

    /// The `apiVersion` string for this group and version
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// The kind of the matching list type, `APIList` for `API`
    pub fn list(&self) -> Self {
        Self::new(&self.group, &self.version, format!("{}List", self.kind))
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

/// The `apiVersion` and `kind` of a decoded document, empty when absent or
/// not strings
pub fn type_meta(document: &serde_json::Value) -> (&str, &str) {
    let field = |name: &str| {
        document
            .get(name)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
    };
    (field("apiVersion"), field("kind"))
}
