//! Declared configuration model
//!
//! These are the raw, user-facing shapes of `values.yaml` and of an
//! environment overlay. Nothing here is validated beyond what serde enforces;
//! [`crate::resolve`] turns them into resolved records.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::values::Values;

/// The full declared configuration of a pack (`values.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartValues {
    /// Shared environment settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Application entries, in declaration order
    #[serde(default)]
    pub apps: Vec<AppSpec>,

    /// Centralized ingress rule set
    #[serde(default)]
    pub ingress: Option<IngressSpec>,

    /// Access-control objects
    #[serde(default)]
    pub rbac: AccessControlSpec,
}

impl ChartValues {
    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Values::from_yaml(yaml)?.decode()
    }

    /// Decode from a merged values document
    pub fn from_values(values: &Values) -> Result<Self> {
        values.decode()
    }
}

/// Settings that can be given at every layer (app, environment, global)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default)]
    pub image: ImageSettings,

    /// Color that receives traffic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_probe: Option<StartupProbeConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hpa: Option<HpaConfig>,

    /// Secret whose keys are exposed as environment variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_from: Option<String>,
}

/// Image coordinates; every part may come from a different layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_scalar_string"
    )]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,
}

/// Shared environment settings (`global:`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Defaults for every application
    #[serde(flatten)]
    pub defaults: AppSettings,

    #[serde(default)]
    pub image_pull_secrets: Vec<String>,

    /// Replaces the chart name in generated names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_override: Option<String>,

    /// Replaces the whole generated base name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname_override: Option<String>,
}

/// One application entry (`apps[]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Unique within a render
    #[serde(default)]
    pub name: String,

    /// Workload label (`app`), defaults to the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,

    #[serde(flatten)]
    pub settings: AppSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<PortSet>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvEntry>,

    /// `None` (absent or `null`) means no Service object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceConfig>,

    /// Variant color of this workload, defaults to the active color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Primary and optional secondary (gRPC) ports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupProbeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// HTTP path to probe; TCP socket probe when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub requests: ResourceQuantities,

    #[serde(default)]
    pub limits: ResourceQuantities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuantities {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_scalar_string"
    )]
    pub cpu: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_scalar_string"
    )]
    pub memory: Option<String>,
}

impl ResourceQuantities {
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none() && self.memory.is_none()
    }
}

/// Environment source for a literal environment variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvEntry {
    pub name: String,

    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// `ClusterIP` when omitted
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HpaConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<i32>,

    #[serde(
        default,
        rename = "targetCPUUtilizationPercentage",
        alias = "targetCpuUtilizationPercentage",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_cpu_utilization_percentage: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_memory_utilization_percentage: Option<i32>,
}

/// Centralized ingress (`ingress:`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    /// Defaults to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    #[serde(default)]
    pub rules: Vec<IngressRuleSpec>,

    #[serde(default)]
    pub tls: Vec<IngressTlsSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRuleSpec {
    pub host: String,

    #[serde(default)]
    pub paths: Vec<IngressPathSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressPathSpec {
    #[serde(default = "default_path")]
    pub path: String,

    /// `Prefix` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_type: Option<String>,

    pub backend: IngressBackendSpec,
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressBackendSpec {
    /// Name of the backend application entry
    #[serde(alias = "service")]
    pub app: String,

    pub port: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressTlsSpec {
    #[serde(default)]
    pub hosts: Vec<String>,

    pub secret_name: String,
}

/// Access-control set (`rbac:`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlSpec {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_binding_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret_name: Option<String>,

    /// Group bound to the role alongside the service account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_group: Option<String>,

    /// Replaces the default deployer rules when non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PolicyRuleSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRuleSpec {
    #[serde(default)]
    pub api_groups: Vec<String>,

    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default)]
    pub verbs: Vec<String>,
}

/// One environment's overlay (`environments/<name>.yaml`)
///
/// Sits between per-app values and global defaults in the precedence order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentOverlay {
    #[serde(flatten)]
    pub settings: AppSettings,

    /// Replaces the global pull secrets when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<String>>,

    /// Environment-level overrides for one specific application
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub apps: IndexMap<String, AppSettings>,
}

impl EnvironmentOverlay {
    /// Load an overlay from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Values::from_file(path)?.decode()
    }

    /// Parse an overlay from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Values::from_yaml(yaml)?.decode()
    }
}

/// Accept any YAML scalar where a string is expected (`tag: 1.25`, `value: 8080`)
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {}",
            other
        ))),
    }
}

fn optional_scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: &str = r#"
global:
  namespace: shop
  activeColor: blue
  image:
    registry: registry.example.com
    repository: team
    pullPolicy: IfNotPresent
  imagePullSecrets: [regcred]
apps:
  - name: api
    replicas: 2
    image:
      name: api
      tag: 1.4
    ports:
      port: 8080
    env:
      - name: PORT
        value: 8080
    service:
      type: ClusterIP
  - name: worker
    service: null
ingress:
  annotations:
    nginx.ingress.kubernetes.io/ssl-redirect: "true"
  rules:
    - host: shop.example.com
      paths:
        - path: /api
          backend:
            service: api
            port: 8080
rbac:
  enabled: true
  subjectGroup: deployers
"#;

    #[test]
    fn test_parse_chart_values() {
        let values = ChartValues::from_yaml(VALUES).unwrap();

        assert_eq!(values.global.defaults.namespace.as_deref(), Some("shop"));
        assert_eq!(values.global.image_pull_secrets, vec!["regcred"]);
        assert_eq!(
            values.global.defaults.image.registry.as_deref(),
            Some("registry.example.com")
        );

        assert_eq!(values.apps.len(), 2);
        let api = &values.apps[0];
        assert_eq!(api.settings.replicas, Some(2));
        // Numeric scalars are accepted as strings
        assert_eq!(api.settings.image.tag.as_deref(), Some("1.4"));
        assert_eq!(api.env[0].value, "8080");
        assert_eq!(
            api.service.as_ref().unwrap().service_type.as_deref(),
            Some("ClusterIP")
        );

        // service: null means no service
        assert!(values.apps[1].service.is_none());

        let ingress = values.ingress.unwrap();
        let path = &ingress.rules[0].paths[0];
        assert_eq!(path.backend.app, "api");
        assert_eq!(path.path_type, None);

        assert!(values.rbac.enabled);
        assert_eq!(values.rbac.subject_group.as_deref(), Some("deployers"));
    }

    #[test]
    fn test_default_ingress_path() {
        let ingress: IngressSpec = serde_yaml::from_str(
            r#"
rules:
  - host: a.example.com
    paths:
      - backend: { app: api, port: 80 }
"#,
        )
        .unwrap();
        assert_eq!(ingress.rules[0].paths[0].path, "/");
    }

    #[test]
    fn test_parse_environment_overlay() {
        let overlay = EnvironmentOverlay::from_yaml(
            r#"
namespace: shop-prod
activeColor: green
image:
  tag: "2.0.0"
imagePullSecrets: [prod-regcred]
apps:
  api:
    replicas: 6
"#,
        )
        .unwrap();

        assert_eq!(overlay.settings.namespace.as_deref(), Some("shop-prod"));
        assert_eq!(overlay.settings.active_color.as_deref(), Some("green"));
        assert_eq!(overlay.settings.image.tag.as_deref(), Some("2.0.0"));
        assert_eq!(overlay.image_pull_secrets, Some(vec!["prod-regcred".to_string()]));
        assert_eq!(overlay.apps["api"].replicas, Some(6));
    }

    #[test]
    fn test_missing_sections_default() {
        let values = ChartValues::from_yaml("apps: []").unwrap();
        assert!(values.ingress.is_none());
        assert!(!values.rbac.enabled);
        assert!(values.global.image_pull_secrets.is_empty());
    }
}
