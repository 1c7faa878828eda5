//! hubcrd Core - Manifest and CRD handling for hub.traefik.io resources
//!
//! This crate provides the building blocks of the validation pipeline:
//! - `FileSystem`: Disk or in-memory manifest trees
//! - `load_manifests`: Multi-document YAML/JSON loading
//! - `CrdDecoder`: CustomResourceDefinition decoding to a version-independent model
//! - `HubDecoder`: Hub resource decoding into `Unstructured` objects
//! - `FieldError`: Field-level validation errors

pub mod crd;
pub mod error;
pub mod field;
pub mod files;
pub mod gvk;
pub mod hub;
pub mod loader;
pub mod scheme;
pub mod unstructured;

pub use crd::{CrdDecoder, CustomResourceDefinition, JSONSchemaProps, ResourceScope, get_crds};
pub use error::{CoreError, Result, error_chain};
pub use field::{ErrorList, ErrorType, FieldError, Path};
pub use files::{DiskFileSystem, FileSystem, MemoryFileSystem};
pub use gvk::GroupVersionKind;
pub use hub::{HubDecoder, KnownFields};
pub use loader::{Manifest, load_manifests};
pub use scheme::{HUB_GROUP, HUB_KINDS, HUB_VERSION, Scheme};
pub use unstructured::Unstructured;
