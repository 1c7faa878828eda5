//! Snapshot tests for report formatting

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run hubcrd command and capture output
fn hubcrd_output(args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(env!("CARGO_BIN_EXE_hubcrd"))
        .args(args)
        .env_remove("HUBCRD_CRDS")
        .env_remove("HUBCRD_NO_EMBEDDED")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute hubcrd");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (stdout, stderr, output.status.code())
}

fn create_manifests(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

/// The JSON report with the temporary directory renamed `tmp`
fn json_report(dir: &TempDir) -> serde_json::Value {
    let root = dir.path().to_string_lossy().to_string();
    let (stdout, _, code) = hubcrd_output(&["validate", "--json", &root]);
    assert_eq!(code, Some(2));

    let mut json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    for section in ["errors", "warnings"] {
        for entry in json[section].as_array_mut().unwrap() {
            let file = entry["file"].as_str().unwrap().replace(&root, "tmp");
            entry["file"] = serde_json::Value::String(file);
        }
    }
    json
}

#[test]
fn test_json_report_snapshot() {
    let dir = create_manifests(&[
        (
            "gateway.yaml",
            r#"apiVersion: hub.traefik.io/v1alpha1
kind: APIGateway
metadata:
  name: gateway
  namespace: apps
spec:
  customDomains:
    - api.example.com
    - api.example.com
"#,
        ),
        (
            "portal.yaml",
            r#"apiVersion: hub.traefik.io/v1alpha1
kind: APIPortal
metadata:
  name: portal
  namespace: apps
spec:
  title: Developer portal
"#,
        ),
    ]);

    insta::assert_yaml_snapshot!(json_report(&dir), @r###"
    documents: 2
    errors:
      - badValue: ""
        detail: not allowed on this type
        field: metadata.namespace
        file: tmp/gateway.yaml
        kind: APIGateway
        name: gateway
        type: FieldValueForbidden
      - badValue: array
        detail: duplicate domains
        field: spec.customDomains
        file: tmp/gateway.yaml
        kind: APIGateway
        name: gateway
        type: FieldValueInvalid
      - badValue: ""
        detail: ""
        field: spec.auth
        file: tmp/portal.yaml
        kind: APIPortal
        name: portal
        type: FieldValueRequired
    valid: false
    warnings: []
    "###);
}

#[test]
fn test_field_error_lines() {
    let dir = create_manifests(&[(
        "app.yaml",
        r#"apiVersion: hub.traefik.io/v1alpha1
kind: ManagedApplication
metadata:
  name: app
  namespace: apps
spec:
  appId: app
  owner: alice
  apiKeys:
    - title: main
      secretName: app-key
      value: s3cr3t
"#,
    )]);

    let (stdout, _, code) = hubcrd_output(&["validate", &dir.path().to_string_lossy()]);
    assert_eq!(code, Some(2));

    let lines: Vec<&str> = stdout
        .lines()
        .filter(|l| l.trim_start().starts_with('✗'))
        .map(str::trim)
        .collect();
    insta::assert_snapshot!(lines.join("\n"), @r###"
    ✗ ManagedApplication/app spec.apiKeys[0]: Invalid value: "object": secretName and value are mutually exclusive
    ✗ Validation failed: 1 error, 0 warnings in 1 document
    "###);
}
