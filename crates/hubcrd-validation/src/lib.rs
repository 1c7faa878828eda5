//! hubcrd Validation - Validating custom resources against their CRDs
//!
//! A [`Validator`] is built once from a set of CustomResourceDefinitions and
//! then checks decoded objects the way the Kubernetes API server would:
//! - Object metadata: name, namespace, labels, annotations, finalizers
//! - The OpenAPI v3 schema of the object's version
//! - `x-kubernetes-validations` CEL rules, evaluated with `kube_cel`
//!
//! Invalid objects are reported as a list of field errors, never as an
//! `Err`: only building the validator can fail.
//!
//! # Example
//!
//! ```
//! use hubcrd_core::HubDecoder;
//! use hubcrd_validation::build_hub_validator;
//!
//! let validator = build_hub_validator().unwrap();
//! let object = HubDecoder::new()
//!     .decode(b"apiVersion: hub.traefik.io/v1alpha1\nkind: APIRateLimit\nmetadata:\n  name: limit\nspec:\n  limit: -10\n")
//!     .unwrap()
//!     .unwrap();
//!
//! let errors = validator.validate(&object);
//! assert_eq!(errors[0].to_string(), "spec.limit: Invalid value: \"integer\": must be a positive number");
//! ```

pub mod cel;
pub mod cluster;
pub mod duration;
pub mod error;
pub mod formats;
pub mod hub;
pub mod metadata;
pub mod openapi;
pub mod pruning;
pub mod structural;
pub mod validator;

pub use cel::CelValidator;
pub use cluster::{fetch_crds, register_from_cluster};
pub use error::{Result, ValidationError};
pub use hub::{HUB_CRDS, build_hub_validator, build_hub_validator_with, hub_crds};
pub use metadata::{NameRule, validate_object_meta};
pub use openapi::SchemaValidator;
pub use structural::Structural;
pub use validator::{Validator, ValidatorConfig};
