//! Registering CRDs read from disk

use hubcrd_core::{DiskFileSystem, FieldError, HubDecoder, Path, Scheme, error_chain};
use hubcrd_validation::Validator;
use std::fs;
use tempfile::TempDir;

const WIDGET_CRD: &str = r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  scope: Cluster
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              required: [size]
              properties:
                size:
                  type: integer
"#;

fn crd_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

#[test]
fn test_register_all_from_directory() {
    let dir = crd_dir(&[
        ("crds/widgets.yaml", WIDGET_CRD),
        ("README.md", "not a manifest"),
    ]);

    let mut validator = Validator::new();
    let crds = validator
        .register_all(&DiskFileSystem::new(dir.path()).unwrap())
        .unwrap();
    assert_eq!(crds.len(), 1);

    let mut scheme = Scheme::new();
    for crd in &crds {
        scheme.add_crd(crd);
    }
    let object = HubDecoder::with_scheme(scheme)
        .decode(b"apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: big\n  namespace: apps\nspec: {}\n")
        .unwrap()
        .expect("a registered kind");

    let errors = validator.validate(&object);
    let want = vec![
        FieldError::forbidden(&Path::new("metadata").child("namespace"), "not allowed on this type"),
        FieldError::required(&Path::new("spec").child("size"), ""),
    ];
    assert_eq!(errors, want);
}

#[test]
fn test_register_all_reports_the_broken_file() {
    let dir = crd_dir(&[("widgets.yaml", "apiVersion: apiextensions.k8s.io/v1\nkind: [unclosed\n")]);

    let mut validator = Validator::new();
    let err = validator
        .register_all(&DiskFileSystem::new(dir.path()).unwrap())
        .unwrap_err();
    assert!(error_chain(&err).contains("widgets.yaml"), "{}", error_chain(&err));
    assert!(validator.kinds().is_empty());
}
