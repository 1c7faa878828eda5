//! Display formatting for CLI output
//!
//! Issues are collected into a [`ValidationReport`], then printed grouped by
//! file or serialized as JSON.

use console::style;
use hubcrd_core::FieldError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found in one document
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub file: String,
    /// `Kind/name` of the object, empty when the document was not decoded
    pub object: String,
    pub message: String,
    pub entry: ReportEntry,
}

/// One entry of the JSON report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub file: String,
    pub kind: String,
    pub name: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub field: String,
    pub bad_value: Value,
    pub detail: String,
}

/// The JSON report
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub valid: bool,
    pub documents: usize,
    pub errors: Vec<&'a ReportEntry>,
    pub warnings: Vec<&'a ReportEntry>,
}

/// Grouped validation results for display
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub documents: usize,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field error of a decoded object
    pub fn add_field_error(&mut self, file: &str, kind: &str, name: &str, error: &FieldError) {
        let error_type = serde_json::to_value(error.error_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            file: file.to_string(),
            object: format!("{kind}/{name}"),
            message: error.to_string(),
            entry: ReportEntry {
                file: file.to_string(),
                kind: kind.to_string(),
                name: name.to_string(),
                error_type,
                field: error.field.clone(),
                bad_value: error.bad_value.clone(),
                detail: error.detail.clone(),
            },
        });
    }

    /// Add a document that could not be decoded
    pub fn add_decode_error(&mut self, file: &str, message: &str) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            file: file.to_string(),
            object: String::new(),
            message: message.to_string(),
            entry: ReportEntry {
                file: file.to_string(),
                kind: String::new(),
                name: String::new(),
                error_type: "DecodeError".to_string(),
                field: String::new(),
                bad_value: Value::Null,
                detail: message.to_string(),
            },
        });
    }

    /// Add a document of a known group whose kind is not registered
    pub fn add_unknown_kind(&mut self, file: &str, kind: &str, suggestion: Option<&str>) {
        let message = match suggestion {
            Some(s) => format!("unknown kind {kind:?}, did you mean {s:?}?"),
            None => format!("unknown kind {kind:?}"),
        };
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            file: file.to_string(),
            object: String::new(),
            message: message.clone(),
            entry: ReportEntry {
                file: file.to_string(),
                kind: kind.to_string(),
                name: String::new(),
                error_type: "UnknownKind".to_string(),
                field: String::new(),
                bad_value: Value::Null,
                detail: message,
            },
        });
    }

    /// Display issues grouped by file
    pub fn display(&self) {
        let mut by_file: BTreeMap<&str, Vec<&ValidationIssue>> = BTreeMap::new();
        for issue in &self.issues {
            by_file.entry(&issue.file).or_default().push(issue);
        }

        for (file, issues) in by_file {
            println!();
            println!("{}", style(file).cyan().bold());

            for issue in issues {
                let icon = match issue.severity {
                    Severity::Error => style("✗").red(),
                    Severity::Warning => style("⚠").yellow(),
                };

                if issue.object.is_empty() {
                    println!("  {} {}", icon, issue.message);
                } else {
                    println!("  {} {} {}", icon, style(&issue.object).dim(), issue.message);
                }
            }
        }
    }

    /// Get summary counts
    pub fn summary(&self) -> (usize, usize) {
        let errors = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        (errors, self.issues.len() - errors)
    }

    /// Print summary line
    pub fn print_summary(&self) {
        let (errors, warnings) = self.summary();
        let documents = pluralize(self.documents, "document", "documents");
        if errors > 0 {
            println!(
                "{} Validation failed: {}, {} in {}",
                style("✗").red().bold(),
                pluralize(errors, "error", "errors"),
                pluralize(warnings, "warning", "warnings"),
                documents
            );
        } else if warnings > 0 {
            println!(
                "{} {} valid with {}",
                style("⚠").yellow().bold(),
                documents,
                pluralize(warnings, "warning", "warnings")
            );
        } else {
            println!("{} {} valid", style("✓").green().bold(), documents);
        }
    }

    /// Check if there are any errors (not warnings)
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn to_json(&self) -> JsonReport<'_> {
        JsonReport {
            valid: !self.has_errors(),
            documents: self.documents,
            errors: self.entries(Severity::Error),
            warnings: self.entries(Severity::Warning),
        }
    }

    fn entries(&self, severity: Severity) -> Vec<&ReportEntry> {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .map(|i| &i.entry)
            .collect()
    }
}

/// Format count with proper pluralization
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
