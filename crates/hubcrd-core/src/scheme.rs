//! Type scheme: the set of kinds a decoder accepts
//!
//! A scheme is an explicit value built once and handed to the decoders that
//! need it.

use std::collections::BTreeSet;

use crate::crd::CustomResourceDefinition;
use crate::gvk::GroupVersionKind;

pub const HUB_GROUP: &str = "hub.traefik.io";
pub const HUB_VERSION: &str = "v1alpha1";

/// Kinds of the hub.traefik.io/v1alpha1 API
pub const HUB_KINDS: &[&str] = &[
    "AccessControlPolicy",
    "AIService",
    "API",
    "APIAccess",
    "APIAuth",
    "APIBundle",
    "APICatalogItem",
    "APIGateway",
    "APIPlan",
    "APIPortal",
    "APIPortalAuth",
    "APIRateLimit",
    "APIVersion",
    "ManagedApplication",
    "ManagedSubscription",
    "Uplink",
];

const APIEXTENSIONS_GROUP: &str = "apiextensions.k8s.io";
const APIEXTENSIONS_VERSIONS: &[&str] = &["v1", "v1beta1"];

#[derive(Debug, Clone, Default)]
pub struct Scheme {
    kinds: BTreeSet<GroupVersionKind>,
}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hub.traefik.io/v1alpha1 kinds and their lists
    pub fn hub() -> Self {
        let mut scheme = Self::new();
        scheme.add_known_types(HUB_GROUP, HUB_VERSION, HUB_KINDS);
        scheme
    }

    /// CustomResourceDefinition in every supported apiextensions version
    pub fn apiextensions() -> Self {
        let mut scheme = Self::new();
        for version in APIEXTENSIONS_VERSIONS {
            scheme.add_known_types(APIEXTENSIONS_GROUP, version, &["CustomResourceDefinition"]);
        }
        scheme
    }

    pub fn add_known_type(&mut self, gvk: GroupVersionKind) {
        self.kinds.insert(gvk);
    }

    /// Register each kind along with its `List` kind
    pub fn add_known_types(&mut self, group: &str, version: &str, kinds: &[&str]) {
        for kind in kinds {
            let gvk = GroupVersionKind::new(group, version, *kind);
            self.kinds.insert(gvk.list());
            self.kinds.insert(gvk);
        }
    }

    /// Register the kind of every version a CRD defines
    pub fn add_crd(&mut self, crd: &CustomResourceDefinition) {
        for version in &crd.spec.versions {
            let gvk = GroupVersionKind::new(&crd.spec.group, &version.name, crd.kind());
            let list = if crd.spec.names.list_kind.is_empty() {
                gvk.list()
            } else {
                GroupVersionKind::new(&crd.spec.group, &version.name, &crd.spec.names.list_kind)
            };
            self.kinds.insert(gvk);
            self.kinds.insert(list);
        }
    }

    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.kinds.contains(gvk)
    }

    /// Whether any registered kind lives in `group`
    pub fn has_group(&self, group: &str) -> bool {
        self.kinds.iter().any(|gvk| gvk.group == group)
    }

    /// Registered kinds in sorted order
    pub fn known_kinds(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.kinds.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_scheme() {
        let scheme = Scheme::hub();
        assert!(scheme.recognizes(&GroupVersionKind::new(HUB_GROUP, HUB_VERSION, "APIAccess")));
        assert!(scheme.recognizes(&GroupVersionKind::new(HUB_GROUP, HUB_VERSION, "APIAccessList")));
        assert!(!scheme.recognizes(&GroupVersionKind::new(HUB_GROUP, "v1", "APIAccess")));
        assert!(!scheme.recognizes(&GroupVersionKind::new(HUB_GROUP, HUB_VERSION, "Middleware")));
        assert_eq!(scheme.known_kinds().count(), HUB_KINDS.len() * 2);
    }

    #[test]
    fn test_apiextensions_scheme() {
        let scheme = Scheme::apiextensions();
        assert!(scheme.recognizes(&GroupVersionKind::new(
            "apiextensions.k8s.io",
            "v1",
            "CustomResourceDefinition"
        )));
        assert!(scheme.has_group("apiextensions.k8s.io"));
        assert!(!scheme.has_group(HUB_GROUP));
    }
}
