//! Synthesized manifests and their ordered collection

use indexmap::IndexMap;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::core::v1::{Secret, Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;

/// A typed Kubernetes object produced by a synthesizer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Deployment(Deployment),
    Service(Service),
    HorizontalPodAutoscaler(HorizontalPodAutoscaler),
    Ingress(Ingress),
    ServiceAccount(ServiceAccount),
    Role(Role),
    RoleBinding(RoleBinding),
    Secret(Secret),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deployment(_) => "Deployment",
            Self::Service(_) => "Service",
            Self::HorizontalPodAutoscaler(_) => "HorizontalPodAutoscaler",
            Self::Ingress(_) => "Ingress",
            Self::ServiceAccount(_) => "ServiceAccount",
            Self::Role(_) => "Role",
            Self::RoleBinding(_) => "RoleBinding",
            Self::Secret(_) => "Secret",
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(o) => &o.metadata,
            Self::Service(o) => &o.metadata,
            Self::HorizontalPodAutoscaler(o) => &o.metadata,
            Self::Ingress(o) => &o.metadata,
            Self::ServiceAccount(o) => &o.metadata,
            Self::Role(o) => &o.metadata,
            Self::RoleBinding(o) => &o.metadata,
            Self::Secret(o) => &o.metadata,
        }
    }
}

/// One output document
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Logical file this object belongs to, e.g. `api/deployment.yaml`
    pub source: String,
    pub resource: Resource,
}

impl Manifest {
    pub fn new(source: impl Into<String>, resource: Resource) -> Self {
        Self {
            source: source.into(),
            resource,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.resource.kind()
    }

    pub fn name(&self) -> &str {
        self.resource.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.resource.metadata().namespace.as_deref()
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.resource.metadata().labels.clone().unwrap_or_default()
    }

    /// Serialize the object alone
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.resource)?)
    }
}

/// Ordered output of one render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestSet {
    manifests: Vec<Manifest>,
}

impl ManifestSet {
    pub fn new(manifests: Vec<Manifest>) -> Self {
        Self { manifests }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Manifest> {
        self.manifests.iter()
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Kinds in output order
    pub fn kinds(&self) -> Vec<&'static str> {
        self.manifests.iter().map(|m| m.kind()).collect()
    }

    /// Find an object by kind and name
    pub fn find(&self, kind: &str, name: &str) -> Option<&Manifest> {
        self.manifests
            .iter()
            .find(|m| m.kind() == kind && m.name() == name)
    }

    /// Keep only the manifests whose source matches one of `sources`
    pub fn filter_sources(&self, sources: &[String]) -> Self {
        let manifests = self
            .manifests
            .iter()
            .filter(|m| {
                sources
                    .iter()
                    .any(|s| m.source == *s || m.source.starts_with(&format!("{}/", s.trim_end_matches('/'))))
            })
            .cloned()
            .collect();
        Self { manifests }
    }

    /// Serialized documents grouped by source file, in output order
    pub fn by_source(&self) -> Result<IndexMap<String, String>> {
        let mut files: IndexMap<String, String> = IndexMap::new();
        for manifest in &self.manifests {
            let content = files.entry(manifest.source.clone()).or_default();
            if !content.is_empty() {
                content.push_str("---\n");
            }
            content.push_str(&manifest.to_yaml()?);
        }
        Ok(files)
    }

    /// Multi-document YAML stream with a `# Source:` comment per document
    pub fn to_yaml(&self) -> Result<String> {
        let mut output = String::new();
        for manifest in &self.manifests {
            output.push_str("---\n");
            output.push_str(&format!("# Source: {}\n", manifest.source));
            output.push_str(&manifest.to_yaml()?);
        }
        Ok(output)
    }
}

impl IntoIterator for ManifestSet {
    type Item = Manifest;
    type IntoIter = std::vec::IntoIter<Manifest>;

    fn into_iter(self) -> Self::IntoIter {
        self.manifests.into_iter()
    }
}

impl<'a> IntoIterator for &'a ManifestSet {
    type Item = &'a Manifest;
    type IntoIter = std::slice::Iter<'a, Manifest>;

    fn into_iter(self) -> Self::IntoIter {
        self.manifests.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_account(name: &str) -> Manifest {
        Manifest::new(
            "rbac/serviceaccount.yaml",
            Resource::ServiceAccount(ServiceAccount {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    namespace: Some("shop".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_manifest_accessors() {
        let manifest = service_account("prod-shop-sa");
        assert_eq!(manifest.kind(), "ServiceAccount");
        assert_eq!(manifest.name(), "prod-shop-sa");
        assert_eq!(manifest.namespace(), Some("shop"));
        assert!(manifest.labels().is_empty());
    }

    #[test]
    fn test_manifest_yaml_carries_kind() {
        let yaml = service_account("prod-shop-sa").to_yaml().unwrap();
        assert!(yaml.starts_with("apiVersion: v1\nkind: ServiceAccount\n"));
        assert!(yaml.contains("name: prod-shop-sa"));
    }

    #[test]
    fn test_set_to_yaml() {
        let set = ManifestSet::new(vec![service_account("a"), service_account("b")]);
        let yaml = set.to_yaml().unwrap();
        assert_eq!(yaml.matches("---\n").count(), 2);
        assert_eq!(yaml.matches("# Source: rbac/serviceaccount.yaml").count(), 2);
    }

    #[test]
    fn test_by_source_joins_documents() {
        let set = ManifestSet::new(vec![service_account("a"), service_account("b")]);
        let files = set.by_source().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files["rbac/serviceaccount.yaml"].matches("---\n").count(), 1);
    }

    #[test]
    fn test_filter_sources() {
        let set = ManifestSet::new(vec![service_account("a")]);
        assert_eq!(set.filter_sources(&["rbac".to_string()]).len(), 1);
        assert_eq!(set.filter_sources(&["rbac/serviceaccount.yaml".to_string()]).len(), 1);
        assert!(set.filter_sources(&["api".to_string()]).is_empty());
        assert!(set.find("ServiceAccount", "a").is_some());
    }
}
