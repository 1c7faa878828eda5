//! CEL validation of `x-kubernetes-validations` rules
//!
//! Rules are compiled once per CRD version with `kube_cel`. Compilation
//! failures and rules whose estimated cost exceeds the per-call budget are
//! rejected when the CRD is registered. At validation time `kube_cel`
//! reports failures against dotted paths; these are resolved back onto the
//! structural schema to build apiextensions field errors.

use hubcrd_core::{ErrorList, FieldError, Path};
use kube_cel::{CompilationError, CompiledSchema, ErrorKind, WarningKind, compile_schema, estimate_rule_cost};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, ValidationError};
use crate::structural::Structural;

/// Evaluates the CEL rules of one CRD version schema
pub struct CelValidator {
    schema: Structural,
    compiled: CompiledSchema,
}

impl std::fmt::Debug for CelValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CelValidator").finish_non_exhaustive()
    }
}

impl CelValidator {
    /// Compile every rule of `schema`, the raw form of `structural`
    ///
    /// Returns `None` when the schema carries no rules at all.
    pub fn new(structural: &Structural, schema: &Value) -> Result<Option<Self>> {
        if !structural.has_rules() {
            return Ok(None);
        }

        let compiled = compile_schema(schema);
        check_rules(&compiled, "openAPIV3Schema")?;

        Ok(Some(Self {
            schema: structural.clone(),
            compiled,
        }))
    }

    /// Run the rules against `document`
    ///
    /// Errors are ordered by the schema node declaring the rule, parents
    /// before children, then in rule order.
    pub fn validate(&self, document: &Value) -> ErrorList {
        let Err(failures) = kube_cel::validate_compiled(&self.compiled, document, None) else {
            return ErrorList::new();
        };

        let mut errors: Vec<(Vec<Step>, FieldError)> = failures
            .into_vec()
            .into_iter()
            .map(|failure| {
                let trail = resolve(&self.schema, document, &failure.field_path);
                let declaring = trail
                    .nodes
                    .iter()
                    .rev()
                    .find(|node| {
                        node.schema
                            .is_some_and(|schema| schema.rules.iter().any(|r| r.rule == failure.rule))
                    })
                    .or(trail.nodes.last());
                let (order, schema_type) = match declaring {
                    Some(node) => (node.order.clone(), node.schema.map_or("object", |s| s.type_.as_str())),
                    None => (Vec::new(), "object"),
                };

                let error = match failure.kind {
                    ErrorKind::ValidationFailure => {
                        error_for_reason(&trail.path, schema_type, failure.message, failure.reason.as_deref())
                    }
                    ErrorKind::UnsupportedReference => {
                        warn!(rule = %failure.rule, "rule uses an unsupported CEL function or macro");
                        FieldError::invalid(&trail.path, schema_type, failure.message)
                    }
                    _ => FieldError::invalid(&trail.path, schema_type, failure.message),
                };
                (order, error)
            })
            .collect();

        errors.sort_by(|a, b| a.0.cmp(&b.0));
        errors.into_iter().map(|(_, error)| error).collect()
    }
}

/// Reject rules that failed to compile or exceed the per-call cost budget
fn check_rules(compiled: &CompiledSchema, path: &str) -> Result<()> {
    for validation in &compiled.validations {
        match validation {
            Ok(result) => {
                if result.is_transition_rule {
                    debug!(rule = %result.rule.rule, path, "transition rule only runs on updates");
                }
                let expensive = estimate_rule_cost(&result.rule.rule, compiled)
                    .into_iter()
                    .find(|warning| warning.kind == WarningKind::CostExceeded);
                if let Some(warning) = expensive {
                    return Err(ValidationError::RuleTooExpensive {
                        rule: result.rule.rule.clone(),
                        path: path.to_string(),
                        message: warning.message,
                    });
                }
            }
            Err(err) => {
                let rule = match err {
                    CompilationError::Parse { rule, .. }
                    | CompilationError::MessageExpressionParse { rule, .. } => rule.clone(),
                    _ => String::new(),
                };
                return Err(ValidationError::CompileRule {
                    rule,
                    path: path.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    let mut names: Vec<&String> = compiled.properties.keys().collect();
    names.sort();
    for name in names {
        check_rules(&compiled.properties[name], &format!("{path}.{name}"))?;
    }
    if let Some(items) = &compiled.items {
        check_rules(items, &format!("{path}[*]"))?;
    }
    if let Some(additional) = &compiled.additional_properties {
        check_rules(additional, &format!("{path}[*]"))?;
    }
    Ok(())
}

fn error_for_reason(path: &Path, schema_type: &str, detail: String, reason: Option<&str>) -> FieldError {
    match reason {
        Some("FieldValueForbidden") => FieldError::forbidden(path, detail),
        Some("FieldValueRequired") => FieldError::required(path, detail),
        Some("FieldValueDuplicate") => FieldError::duplicate(path, schema_type),
        _ => FieldError::invalid(path, schema_type, detail),
    }
}

/// One step of a resolved path, ordered so a parent sorts before its children
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Step {
    Name(String),
    Index(usize),
}

struct TrailNode<'a> {
    order: Vec<Step>,
    schema: Option<&'a Structural>,
}

/// A dotted path resolved against the schema, with every node along the way
struct Trail<'a> {
    path: Path,
    nodes: Vec<TrailNode<'a>>,
}

/// Resolve a reported path such as `spec.headers.X-Id.value` or `apis[1]`
///
/// Map keys may contain dots, so names are matched against the declared
/// properties and the document's keys before falling back to splitting.
fn resolve<'a>(schema: &'a Structural, document: &Value, dotted: &str) -> Trail<'a> {
    let mut path = Path::root();
    let mut node = Some(schema);
    let mut value = Some(document);
    let mut order = Vec::new();
    let mut nodes = vec![TrailNode {
        order: order.clone(),
        schema: node,
    }];

    let mut rest = dotted;
    loop {
        rest = rest.strip_prefix('.').unwrap_or(rest);
        if rest.is_empty() {
            break;
        }

        let Some((step, remaining)) = next_step(rest, node, value) else {
            // Not a path we understand: report it verbatim
            path = path.child(rest);
            break;
        };
        rest = remaining;

        match &step {
            Step::Index(i) => {
                path = path.index(*i);
                node = node.and_then(|n| n.items.as_deref());
                value = value.and_then(|v| v.get(*i));
            }
            Step::Name(name) => {
                match node {
                    Some(n) if n.properties.contains_key(name) => {
                        path = path.child(name.as_str());
                        node = n.properties.get(name);
                    }
                    Some(n) if n.additional_properties.is_some() => {
                        path = path.key(name.as_str());
                        node = n.additional_properties.as_deref();
                    }
                    _ => {
                        path = path.child(name.as_str());
                        node = None;
                    }
                }
                value = value.and_then(|v| v.get(name));
            }
        }
        order.push(step);
        nodes.push(TrailNode {
            order: order.clone(),
            schema: node,
        });
    }

    Trail { path, nodes }
}

fn next_step<'p>(rest: &'p str, node: Option<&Structural>, value: Option<&Value>) -> Option<(Step, &'p str)> {
    if let Some(after) = rest.strip_prefix("['") {
        let end = after.find("']")?;
        return Some((Step::Name(after[..end].to_string()), &after[end + 2..]));
    }
    if let Some(after) = rest.strip_prefix('[') {
        let end = after.find(']')?;
        let index = after[..end].parse().ok()?;
        return Some((Step::Index(index), &after[end + 1..]));
    }

    let ends_step = |name: &str| {
        rest.strip_prefix(name)
            .is_some_and(|after| after.is_empty() || after.starts_with(['.', '[']))
    };
    let declared = node.into_iter().flat_map(|n| n.properties.keys());
    let present = value
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|fields| fields.keys());
    let longest = declared
        .chain(present)
        .filter(|name| !name.is_empty() && ends_step(name.as_str()))
        .map(String::len)
        .max();

    let len = longest.unwrap_or_else(|| rest.find(['.', '[']).unwrap_or(rest.len()));
    if len == 0 {
        return None;
    }
    Some((Step::Name(rest[..len].to_string()), &rest[len..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubcrd_core::ErrorType;
    use serde_json::json;

    fn validator(schema: Value) -> CelValidator {
        let structural = Structural::from_value(&schema, "openAPIV3Schema").unwrap();
        CelValidator::new(&structural, &schema).unwrap().unwrap()
    }

    fn register_error(schema: Value) -> ValidationError {
        let structural = Structural::from_value(&schema, "openAPIV3Schema").unwrap();
        CelValidator::new(&structural, &schema).unwrap_err()
    }

    fn limit_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "spec": {
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "integer",
                            "x-kubernetes-validations": [{"rule": "self >= 0", "message": "must be a positive number"}]
                        },
                        "period": {
                            "type": "string",
                            "format": "duration",
                            "x-kubernetes-validations": [{
                                "rule": "self >= duration('1s') && self <= duration('1h')",
                                "message": "must be between 1s and 1h"
                            }]
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_no_rules() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        let structural = Structural::from_value(&schema, "openAPIV3Schema").unwrap();
        assert!(CelValidator::new(&structural, &schema).unwrap().is_none());
    }

    #[test]
    fn test_passing_rules() {
        let errors = validator(limit_schema()).validate(&json!({"spec": {"limit": 3, "period": "1m"}}));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_failing_rules() {
        let errors = validator(limit_schema()).validate(&json!({"spec": {"limit": -10, "period": "2h"}}));
        assert_eq!(
            errors,
            vec![
                FieldError::invalid(&Path::new("spec").child("limit"), "integer", "must be a positive number"),
                FieldError::invalid(&Path::new("spec").child("period"), "string", "must be between 1s and 1h"),
            ]
        );
    }

    #[test]
    fn test_default_message() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string", "x-kubernetes-validations": [{"rule": "self.startsWith('/')"}]}}
        });
        let errors = validator(schema).validate(&json!({"name": "x"}));
        assert_eq!(errors[0].detail, "failed rule: self.startsWith('/')");
    }

    #[test]
    fn test_message_expression_and_reason() {
        let schema = json!({
            "type": "object",
            "properties": {
                "spec": {
                    "type": "object",
                    "x-kubernetes-validations": [{
                        "rule": "self.replicas <= 5",
                        "messageExpression": "'replicas is ' + string(self.replicas)",
                        "reason": "FieldValueForbidden",
                        "fieldPath": ".replicas"
                    }],
                    "properties": {"replicas": {"type": "integer"}}
                }
            }
        });
        let errors = validator(schema).validate(&json!({"spec": {"replicas": 7}}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::Forbidden);
        assert_eq!(errors[0].field, "spec.replicas");
        assert_eq!(errors[0].detail, "replicas is 7");
    }

    #[test]
    fn test_list_items_and_escaping() {
        let schema = json!({
            "type": "object",
            "properties": {
                "apis": {
                    "type": "array",
                    "maxItems": 100,
                    "x-kubernetes-validations": [{
                        "rule": "self.all(x, self.exists_one(y, x.name == y.name && (has(x.__namespace__) ? x.__namespace__ : 'default') == (has(y.__namespace__) ? y.__namespace__ : 'default')))",
                        "message": "duplicated apis"
                    }],
                    "items": {
                        "type": "object",
                        "properties": {"name": {"type": "string"}, "namespace": {"type": "string"}}
                    }
                }
            }
        });
        let validator = validator(schema);

        let valid = json!({"apis": [{"name": "a"}, {"name": "a", "namespace": "other"}]});
        assert!(validator.validate(&valid).is_empty());

        let duplicated = json!({"apis": [{"name": "a"}, {"name": "a", "namespace": "default"}]});
        assert_eq!(
            validator.validate(&duplicated),
            vec![FieldError::invalid(&Path::new("apis"), "array", "duplicated apis")]
        );
    }

    #[test]
    fn test_item_paths() {
        let schema = json!({
            "type": "object",
            "properties": {
                "domains": {
                    "type": "array",
                    "items": {"type": "string", "x-kubernetes-validations": [{"rule": "self.endsWith('.com')", "message": "must be a .com"}]}
                }
            }
        });
        let errors = validator(schema).validate(&json!({"domains": ["a.com", "b.org", "c.net"]}));
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["domains[1]", "domains[2]"]);
    }

    #[test]
    fn test_map_keys_with_dots() {
        let schema = json!({
            "type": "object",
            "properties": {
                "labels": {
                    "type": "object",
                    "additionalProperties": {
                        "type": "string",
                        "x-kubernetes-validations": [{"rule": "self.size() <= 3", "message": "too long"}]
                    }
                }
            }
        });
        let errors = validator(schema).validate(&json!({"labels": {"app.kubernetes.io/name": "whoami", "ok": "a"}}));
        assert_eq!(
            errors,
            vec![FieldError::invalid(
                &Path::new("labels").key("app.kubernetes.io/name"),
                "string",
                "too long"
            )]
        );
    }

    #[test]
    fn test_parents_before_children() {
        let schema = json!({
            "type": "object",
            "properties": {
                "b": {"type": "integer", "x-kubernetes-validations": [{"rule": "self > 0", "message": "b"}]},
                "a": {
                    "type": "object",
                    "x-kubernetes-validations": [
                        {"rule": "has(self.z)", "message": "a first"},
                        {"rule": "has(self.y)", "message": "a second"}
                    ],
                    "properties": {
                        "x": {"type": "integer", "x-kubernetes-validations": [{"rule": "self > 0", "message": "a.x"}]}
                    }
                }
            }
        });
        let validator = validator(schema);
        let document = json!({"b": 0, "a": {"x": 0}});

        let details: Vec<String> = validator.validate(&document).into_iter().map(|e| e.detail).collect();
        assert_eq!(details, vec!["a first", "a second", "a.x", "b"]);
        assert_eq!(validator.validate(&document), validator.validate(&document));
    }

    #[test]
    fn test_evaluation_error() {
        let schema = json!({
            "type": "object",
            "x-kubernetes-validations": [{"rule": "self.missing == 1", "message": "broken"}],
            "properties": {"missing": {"type": "integer"}}
        });
        let errors = validator(schema).validate(&json!({}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::Invalid);
        assert!(errors[0].detail.starts_with("rule evaluation error"), "{}", errors[0].detail);
    }

    #[test]
    fn test_transition_rules_are_skipped() {
        let schema = json!({
            "type": "object",
            "properties": {"n": {"type": "integer", "x-kubernetes-validations": [{"rule": "self >= oldSelf"}]}}
        });
        assert!(validator(schema).validate(&json!({"n": 1})).is_empty());
    }

    #[test]
    fn test_compile_error() {
        let err = register_error(json!({"type": "string", "x-kubernetes-validations": [{"rule": "self.nope("}]}));
        match err {
            ValidationError::CompileRule { rule, path, .. } => {
                assert_eq!(rule, "self.nope(");
                assert_eq!(path, "openAPIV3Schema");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_expensive_rule_is_rejected() {
        let err = register_error(json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": {"type": "integer"},
                    "x-kubernetes-validations": [{
                        "rule": "self.all(a, self.all(b, self.all(c, a + b + c >= 0)))",
                        "message": "too expensive"
                    }]
                }
            }
        }));
        match err {
            ValidationError::RuleTooExpensive { rule, path, message } => {
                assert_eq!(rule, "self.all(a, self.all(b, self.all(c, a + b + c >= 0)))");
                assert_eq!(path, "openAPIV3Schema.items");
                assert!(message.starts_with("estimated cost"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bounded_rule_is_accepted() {
        let schema = json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "maxItems": 20,
                    "items": {"type": "integer"},
                    "x-kubernetes-validations": [{"rule": "self.all(a, self.exists_one(b, a == b))"}]
                }
            }
        });
        assert!(validator(schema).validate(&json!({"items": [1, 2, 3]})).is_empty());
    }

    #[test]
    fn test_resolve_unknown_path() {
        let schema = Structural::default();
        let trail = resolve(&schema, &json!({}), "spec.a[0]");
        assert_eq!(trail.path.to_string(), "spec.a[0]");
        assert_eq!(trail.nodes.len(), 4);
        assert!(trail.nodes[3].schema.is_none());
    }
}
