//! Manifest engine: resolution, synthesis and aggregation in one pass

use fleetpack_core::color::DEFAULT_COLOR_LABEL;
use fleetpack_core::naming::{DEFAULT_MANAGED_BY, sanitize, truncate_label_value};
use fleetpack_core::{
    ColorRouter, EngineConfig, NameGenerator, RenderContext, RenderError, Resolution, Resolver,
};

use crate::aggregate::{Aggregation, aggregate, duplicate_apps};
use crate::error::{EngineError, RenderReport, Result};
use crate::manifest::ManifestSet;
use crate::meta::SynthContext;

/// Result of rendering with full error collection
#[derive(Debug)]
pub struct RenderResultWithReport {
    /// Manifests; empty when any error was found
    pub manifests: ManifestSet,

    /// Every error found
    pub report: RenderReport,
}

impl RenderResultWithReport {
    /// Check if rendering was fully successful
    pub fn is_success(&self) -> bool {
        !self.report.has_errors()
    }
}

/// Engine builder
pub struct EngineBuilder {
    managed_by: String,
    color_label: String,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            managed_by: DEFAULT_MANAGED_BY.to_string(),
            color_label: DEFAULT_COLOR_LABEL.to_string(),
        }
    }

    /// Take the options a pack declares in its `engine:` block
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new()
            .managed_by(&config.managed_by)
            .color_label(&config.color_label)
    }

    /// Set the `app.kubernetes.io/managed-by` value
    pub fn managed_by(mut self, marker: impl Into<String>) -> Self {
        self.managed_by = marker.into();
        self
    }

    /// Set the label key carrying the blue/green color
    pub fn color_label(mut self, key: impl Into<String>) -> Self {
        self.color_label = key.into();
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        Engine {
            managed_by: self.managed_by,
            router: ColorRouter::new(self.color_label),
        }
    }
}

/// The manifest engine
///
/// Holds options only; every render starts from scratch.
#[derive(Debug, Clone)]
pub struct Engine {
    managed_by: String,
    router: ColorRouter,
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::new().build()
    }
}

impl Engine {
    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Name generator for one render
    pub fn names(&self, context: &RenderContext) -> NameGenerator {
        let global = &context.values.global;
        NameGenerator::new(
            context.pack.name.as_str(),
            context.pack.version.as_str(),
            context.release.name.as_str(),
        )
        .managed_by(self.managed_by.as_str())
        .name_override(global.name_override.clone())
        .fullname_override(global.fullname_override.clone())
    }

    /// Resolve every setting without synthesizing anything
    pub fn resolve(&self, context: &RenderContext) -> Resolution {
        Resolver::new(
            &context.values,
            context.environment.as_ref(),
            &context.release.namespace,
        )
        .with_router(self.router.clone())
        .resolve()
    }

    /// Render and collect every error instead of stopping at the first
    pub fn render_with_report(&self, context: &RenderContext) -> RenderResultWithReport {
        let names = self.names(context);
        let resolution = self.resolve(context);

        let aggregation = match &resolution.global {
            Ok(global) => {
                let ctx = SynthContext::new(&names, &self.router, global);
                aggregate(&context.values, &resolution, &ctx)
            }
            // Nothing can be synthesized without release-wide settings
            Err(_) => {
                let mut errors = resolution.errors();
                errors.extend(duplicate_apps(&context.values));
                Aggregation {
                    manifests: ManifestSet::default(),
                    errors,
                }
            }
        };

        let mut report = RenderReport::new();
        if !names.release_is_label_value() {
            report.add_error(release_name_error(&context.release.name));
        }
        report.extend(aggregation.errors);

        tracing::debug!(
            release = %context.release.name,
            environment = context.environment_name.as_deref().unwrap_or("-"),
            errors = report.total_errors,
            "render finished"
        );

        // No partial output
        let manifests = if report.has_errors() {
            ManifestSet::default()
        } else {
            aggregation.manifests
        };

        RenderResultWithReport { manifests, report }
    }

    /// Render all manifests, failing with the first error
    pub fn render(&self, context: &RenderContext) -> Result<ManifestSet> {
        let result = self.render_with_report(context);
        match result.report.first() {
            Some(error) => Err(EngineError::Render(error.clone())),
            None => Ok(result.manifests),
        }
    }

    /// Collect every error without producing output
    pub fn validate(&self, context: &RenderContext) -> RenderReport {
        self.render_with_report(context).report
    }
}

/// The release name is carried verbatim by the instance label
fn release_name_error(release: &str) -> RenderError {
    let error = RenderError::schema(
        "release",
        "name",
        format!("`{}` is not a valid label value", release),
    );
    let suggested = truncate_label_value(&sanitize(release));
    if suggested.is_empty() {
        error.with_help("Use at most 63 alphanumerics, `-`, `_` or `.`")
    } else {
        error.with_help(format!("Did you mean `{}`?", suggested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetpack_core::{
        ChartValues, EnvironmentOverlay, PackMetadata, ReleaseInfo, RenderErrorKind,
    };
    use semver::Version;

    const SCENARIO_A: &str = r#"
apps:
  - name: api
    image: { name: api, tag: "1.0" }
    ports: { port: 8080 }
    service: { type: ClusterIP }
    resources:
      enabled: true
      requests: { cpu: 100m, memory: 128Mi }
    hpa: { enabled: true, minReplicas: 2, maxReplicas: 10 }
  - name: worker
    image: { name: worker, tag: "1.0" }
"#;

    fn pack() -> PackMetadata {
        PackMetadata {
            name: "shop".to_string(),
            version: Version::new(1, 0, 0),
            description: None,
            app_version: None,
        }
    }

    fn context(yaml: &str) -> RenderContext {
        let values = ChartValues::from_yaml(yaml).unwrap();
        RenderContext::new(values, ReleaseInfo::new("prod", "shop"), &pack())
    }

    fn render(yaml: &str) -> ManifestSet {
        Engine::default().render(&context(yaml)).unwrap()
    }

    fn with_ingress(backend_port: i32) -> String {
        format!(
            "{}ingress:\n  rules:\n    - host: shop.example.com\n      paths:\n        - path: /api\n          backend: {{ app: api, port: {} }}\n",
            SCENARIO_A, backend_port
        )
    }

    #[test]
    fn test_scenario_basic_apps() {
        let manifests = render(SCENARIO_A);

        assert_eq!(
            manifests.kinds(),
            vec!["Deployment", "Service", "HorizontalPodAutoscaler", "Deployment"]
        );
        assert!(manifests.find("Deployment", "prod-shop-api").is_some());
        assert!(manifests.find("Service", "prod-shop-api").is_some());
        assert!(manifests.find("HorizontalPodAutoscaler", "prod-shop-api").is_some());
        assert!(manifests.find("Deployment", "prod-shop-worker").is_some());
        assert!(manifests.find("Service", "prod-shop-worker").is_none());
    }

    #[test]
    fn test_scenario_ingress_references() {
        let manifests = render(&with_ingress(8080));
        assert_eq!(manifests.kinds().last(), Some(&"Ingress"));

        let err = Engine::default()
            .render(&context(&with_ingress(9090)))
            .unwrap_err();
        assert_eq!(err.render_kind(), Some(RenderErrorKind::Referential));
        assert!(err.to_string().contains("backend `api:9090`"));
    }

    #[test]
    fn test_scenario_duplicate_names() {
        let yaml = r#"
apps:
  - { name: svc, image: { name: a, tag: "1" } }
  - { name: svc, image: { name: b, tag: "1" } }
"#;
        let err = Engine::default().render(&context(yaml)).unwrap_err();
        assert_eq!(err.render_kind(), Some(RenderErrorKind::Conflict));
        assert!(err.to_string().contains("`svc`"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let engine = Engine::default();
        let ctx = context(&with_ingress(8080));
        let first = engine.render(&ctx).unwrap().to_yaml().unwrap();
        let second = engine.render(&ctx).unwrap().to_yaml().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_color_flip_keeps_workloads() {
        // api declares its variant, worker relies on the default
        let declared = SCENARIO_A.replace("  - name: api\n", "  - name: api\n    color: blue\n");
        let blue = render(&declared);
        let green = render(&format!("global:\n  activeColor: green\n{}", declared));

        let deployment_spec = |set: &ManifestSet, name: &str| match &set.find("Deployment", name).unwrap().resource {
            crate::manifest::Resource::Deployment(d) => d.spec.clone().unwrap(),
            _ => unreachable!(),
        };
        for name in ["prod-shop-api", "prod-shop-worker"] {
            let before = deployment_spec(&blue, name);
            let after = deployment_spec(&green, name);
            assert_eq!(before.selector, after.selector);
            assert_eq!(before.template, after.template);
            assert_eq!(after.selector.match_labels.unwrap()["color"], "blue");
        }

        let selector = |set: &ManifestSet| match &set.find("Service", "prod-shop-api").unwrap().resource {
            crate::manifest::Resource::Service(s) => s.spec.as_ref().unwrap().selector.clone().unwrap(),
            _ => unreachable!(),
        };
        assert_eq!(selector(&blue)["color"], "blue");
        assert_eq!(selector(&green)["color"], "green");
    }

    #[test]
    fn test_invalid_release_name_rejected() {
        let values = ChartValues::from_yaml(SCENARIO_A).unwrap();
        let ctx = RenderContext::new(values, ReleaseInfo::new("my release!", "shop"), &pack());

        let result = Engine::default().render_with_report(&ctx);
        assert!(result.manifests.is_empty());
        let error = result.report.first().unwrap();
        assert_eq!(error.kind(), RenderErrorKind::SchemaValidation);
        assert!(error.to_string().contains("release: `name`"));
        assert_eq!(error.help_text(), Some("Did you mean `my-release`?"));
    }

    #[test]
    fn test_long_chart_name_yields_valid_labels() {
        let yaml = format!("global:\n  fullnameOverride: shop\n{}", SCENARIO_A);
        let values = ChartValues::from_yaml(&yaml).unwrap();
        let mut long = pack();
        long.name = "c".repeat(70);
        let ctx = RenderContext::new(values, ReleaseInfo::new("prod", "shop"), &long);

        let manifests = Engine::default().render(&ctx).unwrap();
        assert!(!manifests.is_empty());
        for manifest in manifests.iter() {
            let labels = manifest.labels();
            let chart = &labels["fleetpack.io/chart"];
            assert_eq!(chart.len(), 63);
            assert!(fleetpack_core::naming::is_label_value(chart));
        }
    }

    #[test]
    fn test_environment_overlay_applies() {
        let overlay = EnvironmentOverlay::from_yaml(
            r#"
namespace: shop-staging
activeColor: green
apps:
  api:
    replicas: 3
"#,
        )
        .unwrap();
        let ctx = context(SCENARIO_A).with_environment("staging", overlay);
        let manifests = Engine::default().render(&ctx).unwrap();

        let api = manifests.find("Deployment", "prod-shop-api").unwrap();
        assert_eq!(api.namespace(), Some("shop-staging"));
        assert_eq!(api.labels()["fleetpack.io/active-color"], "green");
        match &api.resource {
            crate::manifest::Resource::Deployment(d) => {
                assert_eq!(d.spec.as_ref().unwrap().replicas, Some(3))
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let yaml = r#"
apps:
  - { name: svc, image: { name: a, tag: "1" } }
  - { name: svc, image: { name: b, tag: "1" } }
  - name: web
    image: { tag: "1" }
    service: { type: Headless }
"#;
        let report = Engine::default().validate(&context(yaml));
        assert!(report.count(RenderErrorKind::Conflict) >= 1);
        assert!(report.count(RenderErrorKind::SchemaValidation) >= 2);
    }

    #[test]
    fn test_no_partial_output() {
        let result = Engine::default().render_with_report(&context(&with_ingress(9090)));
        assert!(!result.is_success());
        assert!(result.manifests.is_empty());
    }

    #[test]
    fn test_long_names_truncated() {
        let name = "a".repeat(60);
        let manifests = render(&format!(
            "apps:\n  - {{ name: {}, image: {{ name: x, tag: \"1\" }} }}\n",
            name
        ));
        let deployment = manifests.iter().next().unwrap();
        assert_eq!(deployment.name().len(), 63);
        assert!(!deployment.name().ends_with('-'));
    }

    #[test]
    fn test_builder_options() {
        let engine = Engine::builder()
            .managed_by("platform")
            .color_label("slot")
            .build();
        let manifests = engine.render(&context(SCENARIO_A)).unwrap();
        let service = manifests.find("Service", "prod-shop-api").unwrap();
        assert_eq!(service.labels()["app.kubernetes.io/managed-by"], "platform");
        match &service.resource {
            crate::manifest::Resource::Service(s) => {
                let selector = s.spec.as_ref().unwrap().selector.clone().unwrap();
                assert_eq!(selector["slot"], "blue");
                assert!(!selector.contains_key("color"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_service_snapshot() {
        let manifests = render(SCENARIO_A);
        let yaml = manifests.find("Service", "prod-shop-api").unwrap().to_yaml().unwrap();
        insta::assert_snapshot!(yaml, @r"
        apiVersion: v1
        kind: Service
        metadata:
          labels:
            app: api
            app.kubernetes.io/instance: prod
            app.kubernetes.io/managed-by: fleetpack
            fleetpack.io/active-color: blue
            fleetpack.io/chart: shop-1.0.0
          name: prod-shop-api
          namespace: shop
        spec:
          ports:
          - name: http
            port: 8080
            protocol: TCP
            targetPort: 8080
          selector:
            app: api
            color: blue
          type: ClusterIP
        ");
    }
}
