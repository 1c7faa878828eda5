//! Object metadata validation
//!
//! Mirrors the checks the API server applies to `metadata` of every custom
//! resource: name, namespace, generation, labels, annotations and
//! finalizers.

use hubcrd_core::{ErrorList, FieldError, Path};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

const DNS1123_LABEL_MAX_LENGTH: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
const LABEL_VALUE_MAX_LENGTH: usize = 63;
const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * (1 << 10);

const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const DNS1123_LABEL_ERR_MSG: &str = "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character";
const DNS1123_SUBDOMAIN_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*";
const DNS1123_SUBDOMAIN_ERR_MSG: &str = "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character";
const QUALIFIED_NAME_FMT: &str = "([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]";
const QUALIFIED_NAME_ERR_MSG: &str = "must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character";
const LABEL_VALUE_FMT: &str = "(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?";
const LABEL_VALUE_ERR_MSG: &str = "a valid label must be an empty string or consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character";

const FINALIZER_ORPHAN: &str = "orphan";
const FINALIZER_DELETE_DEPENDENTS: &str = "foregroundDeletion";

static DNS1123_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{DNS1123_LABEL_FMT}$")).expect("valid regex"));
static DNS1123_SUBDOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{DNS1123_SUBDOMAIN_FMT}$")).expect("valid regex"));
static QUALIFIED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{QUALIFIED_NAME_FMT}$")).expect("valid regex"));
static LABEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{LABEL_VALUE_FMT}$")).expect("valid regex"));

/// Which rule object names must follow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameRule {
    /// At most 63 characters, no dots
    #[default]
    DnsLabel,
    /// At most 253 characters, dot separated labels
    DnsSubdomain,
}

impl NameRule {
    fn check(self, name: &str, prefix: bool) -> Vec<String> {
        let name = if prefix { mask_trailing_dash(name) } else { name.to_string() };
        match self {
            NameRule::DnsLabel => is_dns1123_label(&name),
            NameRule::DnsSubdomain => is_dns1123_subdomain(&name),
        }
    }
}

/// Validate the `metadata` of an object
///
/// `namespaced` tells whether the kind lives in a namespace: the namespace
/// is then required, and forbidden otherwise.
pub fn validate_object_meta(metadata: Option<&Value>, namespaced: bool, rule: NameRule) -> ErrorList {
    let path = Path::new("metadata");
    let empty = Map::new();
    let metadata = metadata.and_then(Value::as_object).unwrap_or(&empty);
    let text = |field: &str| metadata.get(field).and_then(Value::as_str).unwrap_or_default();

    let mut errors = ErrorList::new();

    let generate_name = text("generateName");
    if !generate_name.is_empty() {
        for message in rule.check(generate_name, true) {
            errors.push(FieldError::invalid(&path.child("generateName"), generate_name, message));
        }
    }

    let name = text("name");
    if name.is_empty() {
        errors.push(FieldError::required(&path.child("name"), "name or generateName is required"));
    } else {
        for message in rule.check(name, false) {
            errors.push(FieldError::invalid(&path.child("name"), name, message));
        }
    }

    let namespace = text("namespace");
    if namespaced {
        if namespace.is_empty() {
            errors.push(FieldError::required(&path.child("namespace"), ""));
        } else {
            for message in is_dns1123_label(namespace) {
                errors.push(FieldError::invalid(&path.child("namespace"), namespace, message));
            }
        }
    } else if !namespace.is_empty() {
        errors.push(FieldError::forbidden(&path.child("namespace"), "not allowed on this type"));
    }

    if let Some(generation) = metadata.get("generation").and_then(Value::as_i64) {
        if generation < 0 {
            errors.push(FieldError::invalid(
                &path.child("generation"),
                generation,
                "must be greater than or equal to 0",
            ));
        }
    }

    errors.extend(validate_labels(metadata.get("labels"), &path.child("labels")));
    errors.extend(validate_annotations(metadata.get("annotations"), &path.child("annotations")));
    errors.extend(validate_finalizers(metadata.get("finalizers"), &path.child("finalizers")));

    errors
}

fn validate_labels(labels: Option<&Value>, path: &Path) -> ErrorList {
    let mut errors = ErrorList::new();
    let Some(labels) = labels.and_then(Value::as_object) else {
        return errors;
    };

    for (key, value) in labels {
        for message in is_qualified_name(key) {
            errors.push(FieldError::invalid(path, key.as_str(), message));
        }
        let value = value.as_str().unwrap_or_default();
        for message in is_valid_label_value(value) {
            errors.push(FieldError::invalid(&path.key(key), value, message));
        }
    }
    errors
}

fn validate_annotations(annotations: Option<&Value>, path: &Path) -> ErrorList {
    let mut errors = ErrorList::new();
    let Some(annotations) = annotations.and_then(Value::as_object) else {
        return errors;
    };

    let mut total = 0;
    for (key, value) in annotations {
        for message in is_qualified_name(&key.to_lowercase()) {
            errors.push(FieldError::invalid(path, key.as_str(), message));
        }
        total += key.len() + value.as_str().map_or(0, str::len);
    }

    if total > TOTAL_ANNOTATION_SIZE_LIMIT {
        errors.push(FieldError::too_long(path, TOTAL_ANNOTATION_SIZE_LIMIT));
    }
    errors
}

fn validate_finalizers(finalizers: Option<&Value>, path: &Path) -> ErrorList {
    let mut errors = ErrorList::new();
    let Some(finalizers) = finalizers.and_then(Value::as_array) else {
        return errors;
    };

    let names: Vec<&str> = finalizers.iter().filter_map(Value::as_str).collect();
    for name in &names {
        for message in is_qualified_name(name) {
            errors.push(FieldError::invalid(path, *name, message));
        }
    }

    if names.contains(&FINALIZER_ORPHAN) && names.contains(&FINALIZER_DELETE_DEPENDENTS) {
        errors.push(FieldError::invalid(
            path,
            Value::from(names.clone()),
            format!(
                "finalizer {FINALIZER_ORPHAN} and {FINALIZER_DELETE_DEPENDENTS} cannot be both set"
            ),
        ));
    }
    errors
}

/// Check a DNS-1123 label such as a namespace name
pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        errors.push(max_len_error(DNS1123_LABEL_MAX_LENGTH));
    }
    if !DNS1123_LABEL.is_match(value) {
        if DNS1123_SUBDOMAIN.is_match(value) {
            // a valid subdomain of acceptable length can only fail on dots
            errors.push("must not contain dots".to_string());
        } else {
            errors.push(regex_error(DNS1123_LABEL_ERR_MSG, DNS1123_LABEL_FMT, &["my-name", "123-abc"]));
        }
    }
    errors
}

pub fn is_dns1123_subdomain(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        errors.push(max_len_error(DNS1123_SUBDOMAIN_MAX_LENGTH));
    }
    if !DNS1123_SUBDOMAIN.is_match(value) {
        errors.push(regex_error(
            DNS1123_SUBDOMAIN_ERR_MSG,
            DNS1123_SUBDOMAIN_FMT,
            &["example.com"],
        ));
    }
    errors
}

/// Check a qualified name: an optional DNS subdomain prefix and a name
pub fn is_qualified_name(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let parts: Vec<&str> = value.split('/').collect();

    let name = match parts.as_slice() {
        [name] => *name,
        [prefix, name] => {
            if prefix.is_empty() {
                errors.push(format!("prefix part {}", empty_error()));
            } else {
                for message in is_dns1123_subdomain(prefix) {
                    errors.push(format!("prefix part {message}"));
                }
            }
            name
        }
        _ => {
            errors.push(format!(
                "a qualified name {}",
                regex_error(QUALIFIED_NAME_ERR_MSG, QUALIFIED_NAME_FMT, &["MyName", "my.name", "123-abc"])
            ));
            return errors;
        }
    };

    if name.is_empty() {
        errors.push(format!("name part {}", empty_error()));
    } else if name.len() > QUALIFIED_NAME_MAX_LENGTH {
        errors.push(format!("name part {}", max_len_error(QUALIFIED_NAME_MAX_LENGTH)));
    }
    if !QUALIFIED_NAME.is_match(name) {
        errors.push(format!(
            "name part {}",
            regex_error(QUALIFIED_NAME_ERR_MSG, QUALIFIED_NAME_FMT, &["MyName", "my.name", "123-abc"])
        ));
    }
    errors
}

pub fn is_valid_label_value(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        errors.push(max_len_error(LABEL_VALUE_MAX_LENGTH));
    }
    if !LABEL_VALUE.is_match(value) {
        errors.push(regex_error(LABEL_VALUE_ERR_MSG, LABEL_VALUE_FMT, &["MyValue", "my_value", "12345"]));
    }
    errors
}

fn max_len_error(length: usize) -> String {
    format!("must be no more than {length} characters")
}

fn empty_error() -> &'static str {
    "must be non-empty"
}

/// The message of a failed regex check, with examples of valid values
fn regex_error(message: &str, format: &str, examples: &[&str]) -> String {
    if examples.is_empty() {
        return format!("{message} (regex used for validation is '{format}')");
    }

    let mut rendered = format!("{message} (e.g. ");
    for (i, example) in examples.iter().enumerate() {
        if i > 0 {
            rendered.push_str(" or ");
        }
        rendered.push_str(&format!("'{example}', "));
    }
    rendered.push_str(&format!("regex used for validation is '{format}')"));
    rendered
}

/// Generated names get a random suffix, so a trailing dash is fine
fn mask_trailing_dash(name: &str) -> String {
    match name.strip_suffix('-') {
        Some(stripped) if !stripped.is_empty() => format!("{stripped}a"),
        _ => name.to_string(),
    }
}
