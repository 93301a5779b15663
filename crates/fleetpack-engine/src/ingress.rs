//! Ingress synthesis (`networking.k8s.io/v1 Ingress`)
//!
//! All hosts and paths land in one Ingress named after the release. Every
//! backend is checked against the full application set: it must exist, have
//! a Service in the Ingress namespace, and expose the referenced port.

use fleetpack_core::config::{IngressPathSpec, IngressSpec};
use fleetpack_core::resolve::Resolved;
use fleetpack_core::suggestions::{suggest_enum_value, suggest_name};
use fleetpack_core::{RenderError, ResolvedApp};
use indexmap::IndexMap;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec as IngressObjectSpec, IngressTLS, ServiceBackendPort,
};

use crate::meta::{SynthContext, object_meta};

/// Allowed values of `pathType`
pub const PATH_TYPES: &[&str] = &["Exact", "Prefix", "ImplementationSpecific"];

const DEFAULT_PATH_TYPE: &str = "Prefix";

/// Resolution state of an application, as seen by backend checks
#[derive(Debug, Clone, Copy)]
pub enum AppEntry<'a> {
    Resolved(&'a ResolvedApp),
    /// Failed to resolve; its own errors are already reported
    Unresolved,
}

/// Application entries by name, first declaration wins
#[derive(Debug, Default)]
pub struct AppDirectory<'a> {
    entries: IndexMap<&'a str, AppEntry<'a>>,
}

impl<'a> AppDirectory<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'a str, entry: AppEntry<'a>) {
        self.entries.entry(name).or_insert(entry);
    }

    pub fn get(&self, name: &str) -> Option<AppEntry<'a>> {
        self.entries.get(name).copied()
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.entries.keys().copied().collect()
    }
}

/// Build the Ingress, or `None` when disabled or without rules
pub fn ingress(
    spec: &IngressSpec,
    apps: &AppDirectory<'_>,
    ctx: &SynthContext<'_>,
) -> Resolved<Option<Ingress>> {
    if spec.enabled == Some(false) || spec.rules.is_empty() {
        tracing::debug!("no ingress rules, skipping ingress");
        return Ok(None);
    }

    let mut errors = Vec::new();
    let mut rules = Vec::new();

    for (rule_index, rule) in spec.rules.iter().enumerate() {
        if rule.paths.is_empty() {
            errors.push(RenderError::schema(
                "ingress",
                format!("rules[{}].paths", rule_index),
                "must declare at least one path",
            ));
            continue;
        }

        let mut paths = Vec::new();
        for (path_index, path) in rule.paths.iter().enumerate() {
            let field = format!("rules[{}].paths[{}]", rule_index, path_index);
            match ingress_path(&rule.host, path, &field, apps, ctx) {
                Ok(Some(p)) => paths.push(p),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        rules.push(IngressRule {
            host: (!rule.host.is_empty()).then(|| rule.host.clone()),
            http: Some(HTTPIngressRuleValue { paths }),
        });
    }

    let mut tls = Vec::new();
    for (index, entry) in spec.tls.iter().enumerate() {
        if entry.secret_name.is_empty() {
            errors.push(RenderError::schema(
                "ingress",
                format!("tls[{}].secretName", index),
                "is required",
            ));
            continue;
        }
        tls.push(IngressTLS {
            hosts: (!entry.hosts.is_empty()).then(|| entry.hosts.clone()),
            secret_name: Some(entry.secret_name.clone()),
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut metadata = object_meta(
        ctx.names.fullname(),
        &ctx.global.namespace,
        ctx.release_labels(),
    );
    if !spec.annotations.is_empty() {
        metadata.annotations = Some(spec.annotations.clone());
    }

    Ok(Some(Ingress {
        metadata,
        spec: Some(IngressObjectSpec {
            ingress_class_name: spec.class_name.clone(),
            rules: Some(rules),
            tls: (!tls.is_empty()).then_some(tls),
            ..Default::default()
        }),
        ..Default::default()
    }))
}

/// Check one path and its backend
///
/// `Ok(None)` means the backend app failed to resolve and is skipped.
fn ingress_path(
    host: &str,
    path: &IngressPathSpec,
    field: &str,
    apps: &AppDirectory<'_>,
    ctx: &SynthContext<'_>,
) -> std::result::Result<Option<HTTPIngressPath>, RenderError> {
    let path_type = path.path_type.as_deref().unwrap_or(DEFAULT_PATH_TYPE);
    if !PATH_TYPES.contains(&path_type) {
        return Err(RenderError::schema(
            "ingress",
            format!("{}.pathType", field),
            format!("`{}` is not a valid path type", path_type),
        )
        .with_help(suggest_enum_value(path_type, PATH_TYPES)));
    }
    if !path.path.starts_with('/') {
        return Err(RenderError::schema(
            "ingress",
            format!("{}.path", field),
            format!("`{}` must start with `/`", path.path),
        ));
    }

    let backend = &path.backend;
    let label = format!("{}:{}", backend.app, backend.port);
    let reference = |message: String| RenderError::reference(host, &path.path, &label, message);

    let app = match apps.get(&backend.app) {
        None => {
            let mut err = reference("does not name a known application".to_string());
            if let Some(hint) = suggest_name(&backend.app, &apps.names()) {
                err = err.with_help(hint);
            }
            return Err(err);
        }
        Some(AppEntry::Unresolved) => return Ok(None),
        Some(AppEntry::Resolved(app)) => app,
    };

    if app.service.is_none() {
        return Err(reference("has no service".to_string())
            .with_help(format!("declare `service` on `{}` to route traffic to it", app.name)));
    }

    if app.namespace != ctx.global.namespace {
        return Err(reference(format!(
            "lives in namespace `{}` but the ingress is in `{}`",
            app.namespace, ctx.global.namespace
        )));
    }

    let exposed = app.service_ports();
    if !exposed.contains(&backend.port) {
        let list: Vec<String> = exposed.iter().map(|p| p.to_string()).collect();
        return Err(reference(format!(
            "port {} is not exposed by the service (exposed: {})",
            backend.port,
            list.join(", ")
        )));
    }

    Ok(Some(HTTPIngressPath {
        path: Some(path.path.clone()),
        path_type: path_type.to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: ctx.app_object_name(app),
                port: Some(ServiceBackendPort {
                    number: Some(backend.port),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        },
    }))
}
