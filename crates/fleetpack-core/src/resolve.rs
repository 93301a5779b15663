//! Config resolution
//!
//! Collapses the app, environment and global layers into one fully defaulted
//! record per application. Every enum-like value and range is checked here,
//! once, so the synthesizers downstream never see an invalid setting.
//!
//! The precedence order is [`PRECEDENCE`]. Inside the environment layer the
//! overlay's entry for the specific app is consulted before its top-level
//! settings.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

use crate::color::{Color, ColorRouter};
use crate::config::{
    AppSettings, AppSpec, ChartValues, EnvEntry, EnvironmentOverlay, HpaConfig, ResourceConfig,
    ResourceQuantities, StartupProbeConfig,
};
use crate::error::{RenderError, app_subject};
use crate::naming::{is_dns_label, is_label_value};
use crate::suggestions::{suggest_enum_value, suggest_name};

/// One source of settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    App,
    Environment,
    Global,
    /// Built-in fallback, or the release namespace
    Builtin,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::App => "app",
            Self::Environment => "environment",
            Self::Global => "global",
            Self::Builtin => "builtin",
        };
        f.write_str(name)
    }
}

/// Highest precedence first; built-in fallbacks apply after all of these
pub const PRECEDENCE: [Layer; 3] = [Layer::App, Layer::Environment, Layer::Global];

/// Field path to the layer its value came from
pub type Provenance = BTreeMap<String, Layer>;

/// Errors collected while resolving one entry
pub type Resolved<T> = std::result::Result<T, Vec<RenderError>>;

/// Built-in defaults
pub mod defaults {
    pub const REPLICAS: i32 = 1;
    pub const HPA_MIN_REPLICAS: i32 = 1;
    pub const HPA_CPU_TARGET: i32 = 80;
    pub const PROBE_INITIAL_DELAY_SECONDS: i32 = 0;
    pub const PROBE_PERIOD_SECONDS: i32 = 10;
    pub const PROBE_TIMEOUT_SECONDS: i32 = 1;
    pub const PROBE_FAILURE_THRESHOLD: i32 = 30;
}

static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]+(\.[0-9]+)?(m|k|M|G|T|P|E|Ki|Mi|Gi|Ti|Pi|Ei)?$").expect("valid regex")
});

/// Network-service type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceType {
    ClusterIP,
    NodePort,
    LoadBalancer,
}

impl ServiceType {
    pub const ALLOWED: &'static [&'static str] = &["ClusterIP", "NodePort", "LoadBalancer"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ClusterIP" => Some(Self::ClusterIP),
            "NodePort" => Some(Self::NodePort),
            "LoadBalancer" => Some(Self::LoadBalancer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClusterIP => "ClusterIP",
            Self::NodePort => "NodePort",
            Self::LoadBalancer => "LoadBalancer",
        }
    }
}

/// Container image pull policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

impl PullPolicy {
    pub const ALLOWED: &'static [&'static str] = &["Always", "IfNotPresent", "Never"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Always" => Some(Self::Always),
            "IfNotPresent" => Some(Self::IfNotPresent),
            "Never" => Some(Self::Never),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
            Self::Never => "Never",
        }
    }
}

/// Release-wide settings after resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedGlobal {
    pub namespace: String,
    pub image_pull_secrets: Vec<String>,
    pub active_color: Color,
    pub origins: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImage {
    /// `[registry/][repository/]name:tag`
    pub reference: String,
    pub pull_policy: PullPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPorts {
    pub port: Option<i32>,
    /// Defaults to `port`
    pub target_port: Option<i32>,
    pub grpc_port: Option<i32>,
    pub node_port: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedProbe {
    /// HTTP GET path; TCP socket probe when `None`
    pub path: Option<String>,
    pub port: i32,
    pub initial_delay_seconds: i32,
    pub period_seconds: i32,
    pub timeout_seconds: i32,
    pub failure_threshold: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResources {
    pub requests: ResourceQuantities,
    pub limits: ResourceQuantities,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedHpa {
    pub min_replicas: i32,
    pub max_replicas: i32,
    pub target_cpu: Option<i32>,
    pub target_memory: Option<i32>,
}

/// One application after resolution; every field is final
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedApp {
    /// Position in `apps`
    pub index: usize,
    pub name: String,
    pub namespace: String,
    pub app_label: String,
    pub replicas: i32,
    pub image: ResolvedImage,
    pub command: Option<Vec<String>>,
    pub ports: ResolvedPorts,
    pub startup_probe: Option<ResolvedProbe>,
    pub resources: Option<ResolvedResources>,
    pub env_from: Option<String>,
    pub env: Vec<EnvEntry>,
    pub service: Option<ServiceType>,
    pub hpa: Option<ResolvedHpa>,
    /// Color the Service routes to
    pub active_color: Color,
    /// Color this workload belongs to
    pub color: Color,
    pub image_pull_secrets: Vec<String>,
    pub origins: Provenance,
}

impl ResolvedApp {
    /// `apps[0] (api)`
    pub fn subject(&self) -> String {
        app_subject(self.index, &self.name)
    }

    /// Ports a Service for this app exposes
    pub fn service_ports(&self) -> Vec<i32> {
        if self.service.is_none() {
            return Vec::new();
        }
        let mut ports: Vec<i32> = self.ports.port.into_iter().collect();
        if let (Some(grpc), Some(_)) = (self.ports.grpc_port, self.ports.node_port) {
            ports.push(grpc);
        }
        ports
    }
}

/// A value together with the layer it was taken from
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub layer: Layer,
}

/// The settings blocks consulted for one lookup, by layer
struct SettingsStack<'a> {
    app: Option<&'a AppSettings>,
    environment_app: Option<&'a AppSettings>,
    environment: Option<&'a AppSettings>,
    global: Option<&'a AppSettings>,
}

impl<'a> SettingsStack<'a> {
    fn blocks(&self, layer: Layer) -> Vec<&'a AppSettings> {
        match layer {
            Layer::App => self.app.into_iter().collect(),
            Layer::Environment => self
                .environment_app
                .into_iter()
                .chain(self.environment)
                .collect(),
            Layer::Global => self.global.into_iter().collect(),
            Layer::Builtin => Vec::new(),
        }
    }

    /// Only the blocks that name this specific app
    fn app_scoped(&self) -> Self {
        Self {
            app: self.app,
            environment_app: self.environment_app,
            environment: None,
            global: None,
        }
    }

    /// First layer in precedence order that sets the field
    fn pick<T: Clone + 'a>(&self, get: impl Fn(&'a AppSettings) -> Option<&'a T>) -> Option<Sourced<T>> {
        PRECEDENCE.iter().find_map(|&layer| {
            self.blocks(layer)
                .into_iter()
                .find_map(|block| get(block))
                .map(|value| Sourced {
                    value: value.clone(),
                    layer,
                })
        })
    }
}

/// Accumulates errors and provenance for one entry
struct Findings {
    subject: String,
    errors: Vec<RenderError>,
    origins: Provenance,
}

impl Findings {
    fn new(subject: String) -> Self {
        Self {
            subject,
            errors: Vec::new(),
            origins: Provenance::new(),
        }
    }

    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .push(RenderError::schema(self.subject.clone(), field, message));
    }

    fn error_with_help(&mut self, field: &str, message: impl Into<String>, help: String) {
        self.errors
            .push(RenderError::schema(self.subject.clone(), field, message).with_help(help));
    }

    /// Record where `field` came from and return its value
    fn take<T>(&mut self, field: &str, sourced: Option<Sourced<T>>) -> Option<T> {
        sourced.map(|s| {
            trace!(subject = %self.subject, field, layer = %s.layer, "picked setting");
            self.origins.insert(field.to_string(), s.layer);
            s.value
        })
    }

    fn builtin<T>(&mut self, field: &str, value: T) -> T {
        self.origins.insert(field.to_string(), Layer::Builtin);
        value
    }

    fn finish<T>(self, value: T) -> Resolved<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

/// Everything [`Resolver::resolve`] produced
#[derive(Debug, Clone)]
pub struct Resolution {
    pub global: Resolved<ResolvedGlobal>,
    /// One entry per `apps` element, in declaration order
    pub apps: Vec<Resolved<ResolvedApp>>,
}

impl Resolution {
    /// All errors, global first then per app in order
    pub fn errors(&self) -> Vec<RenderError> {
        let mut errors = Vec::new();
        if let Err(e) = &self.global {
            errors.extend(e.iter().cloned());
        }
        for app in &self.apps {
            if let Err(e) = app {
                errors.extend(e.iter().cloned());
            }
        }
        errors
    }
}

/// Resolves declared configuration against one environment overlay
pub struct Resolver<'a> {
    values: &'a ChartValues,
    environment: Option<&'a EnvironmentOverlay>,
    release_namespace: &'a str,
    router: ColorRouter,
}

impl<'a> Resolver<'a> {
    pub fn new(
        values: &'a ChartValues,
        environment: Option<&'a EnvironmentOverlay>,
        release_namespace: &'a str,
    ) -> Self {
        Self {
            values,
            environment,
            release_namespace,
            router: ColorRouter::default(),
        }
    }

    /// Use a specific color router
    pub fn with_router(mut self, router: ColorRouter) -> Self {
        self.router = router;
        self
    }

    /// Resolve the global settings and every application
    pub fn resolve(&self) -> Resolution {
        let global = self.resolve_global();

        let apps = match &global {
            Ok(g) => self
                .values
                .apps
                .iter()
                .enumerate()
                .map(|(index, spec)| self.resolve_app(index, spec, g))
                .collect(),
            // Without a global record app defaults are unknown; report the
            // app-local problems against a placeholder
            Err(_) => {
                let fallback = self.fallback_global();
                self.values
                    .apps
                    .iter()
                    .enumerate()
                    .map(|(index, spec)| self.resolve_app(index, spec, &fallback))
                    .collect()
            }
        };

        Resolution { global, apps }
    }

    fn stack(&self, spec: Option<&'a AppSpec>) -> SettingsStack<'a> {
        let environment_app = match (self.environment, spec) {
            (Some(env), Some(spec)) => env.apps.get(&spec.name),
            _ => None,
        };
        SettingsStack {
            app: spec.map(|s| &s.settings),
            environment_app,
            environment: self.environment.map(|e| &e.settings),
            global: Some(&self.values.global.defaults),
        }
    }

    /// Resolve namespace, pull secrets and the default active color
    pub fn resolve_global(&self) -> Resolved<ResolvedGlobal> {
        let stack = self.stack(None);
        let mut findings = Findings::new("global".to_string());

        let namespace = match findings.take("namespace", stack.pick(|s| s.namespace.as_ref())) {
            Some(ns) => ns,
            None => findings.builtin("namespace", self.release_namespace.to_string()),
        };
        if !is_dns_label(&namespace) {
            findings.error("namespace", format!("`{}` is not a valid namespace", namespace));
        }

        let image_pull_secrets = match self.environment.and_then(|e| e.image_pull_secrets.clone()) {
            Some(secrets) => {
                findings.origins.insert("imagePullSecrets".to_string(), Layer::Environment);
                secrets
            }
            None => {
                findings.origins.insert("imagePullSecrets".to_string(), Layer::Global);
                self.values.global.image_pull_secrets.clone()
            }
        };
        if image_pull_secrets.iter().any(|s| s.is_empty()) {
            findings.error("imagePullSecrets", "must not contain empty names");
        }

        let raw_color = findings.take("activeColor", stack.pick(|s| s.active_color.as_ref()));
        let declared = raw_color.and_then(|c| parse_color(&mut findings, "activeColor", &c));
        if declared.is_none() {
            findings.origins.insert("activeColor".to_string(), Layer::Builtin);
        }
        let active_color = self.router.resolve(None, declared.as_ref());

        debug!(namespace = %namespace, active_color = %active_color, "resolved global settings");

        let origins = findings.origins.clone();
        findings.finish(ResolvedGlobal {
            namespace,
            image_pull_secrets,
            active_color,
            origins,
        })
    }

    fn fallback_global(&self) -> ResolvedGlobal {
        ResolvedGlobal {
            namespace: self.release_namespace.to_string(),
            image_pull_secrets: self.values.global.image_pull_secrets.clone(),
            active_color: Color::default(),
            origins: Provenance::new(),
        }
    }

    /// Resolve one application entry against the resolved global settings
    pub fn resolve_app(
        &self,
        index: usize,
        spec: &'a AppSpec,
        global: &ResolvedGlobal,
    ) -> Resolved<ResolvedApp> {
        let stack = self.stack(Some(spec));
        let mut f = Findings::new(app_subject(index, &spec.name));

        if spec.name.is_empty() {
            f.error("name", "is required");
        } else if !is_dns_label(&spec.name) {
            f.error(
                "name",
                format!(
                    "`{}` must be lowercase alphanumerics and `-`, at most 63 characters",
                    spec.name
                ),
            );
        }

        // Namespace: app-specific entries, then the global record
        let scoped = stack.app_scoped();
        let namespace = match f.take("namespace", scoped.pick(|s| s.namespace.as_ref())) {
            Some(ns) => {
                if !is_dns_label(&ns) {
                    f.error("namespace", format!("`{}` is not a valid namespace", ns));
                }
                ns
            }
            None => {
                let layer = global
                    .origins
                    .get("namespace")
                    .copied()
                    .unwrap_or(Layer::Builtin);
                f.origins.insert("namespace".to_string(), layer);
                global.namespace.clone()
            }
        };

        let app_label = match &spec.app {
            Some(label) => {
                f.origins.insert("app".to_string(), Layer::App);
                label.clone()
            }
            None => f.builtin("app", spec.name.clone()),
        };
        if !app_label.is_empty() && !is_label_value(&app_label) {
            f.error("app", format!("`{}` is not a valid label value", app_label));
        }

        let replicas = match f.take("replicas", stack.pick(|s| s.replicas.as_ref())) {
            Some(r) => r,
            None => f.builtin("replicas", defaults::REPLICAS),
        };
        if replicas < 0 {
            f.error("replicas", format!("must be >= 0, got {}", replicas));
        }

        let image = self.resolve_image(&stack, &mut f);

        let command = spec.command.clone().filter(|c| !c.is_empty());

        let ports = resolve_ports(spec, &mut f);

        let service = resolve_service(spec, &ports, &mut f);

        let startup_probe = {
            let probe = f.take("startupProbe", stack.pick(|s| s.startup_probe.as_ref()));
            probe.and_then(|p| resolve_probe(&p, &ports, &mut f))
        };

        let resources = {
            let block = f.take("resources", stack.pick(|s| s.resources.as_ref()));
            block.and_then(|r| resolve_resources(&r, &mut f))
        };

        let hpa = {
            let block = f.take("hpa", stack.pick(|s| s.hpa.as_ref()));
            block.and_then(|h| resolve_hpa(&h, resources.as_ref(), &mut f))
        };

        let env_from = f
            .take("envFrom", stack.pick(|s| s.env_from.as_ref()))
            .filter(|s| !s.is_empty());

        check_env(&spec.env, &mut f);

        // Active color: app-specific override, else the global record
        let override_color = f
            .take("activeColor", scoped.pick(|s| s.active_color.as_ref()))
            .and_then(|c| parse_color(&mut f, "activeColor", &c));
        if override_color.is_none() {
            let layer = global
                .origins
                .get("activeColor")
                .copied()
                .unwrap_or(Layer::Builtin);
            f.origins.insert("activeColor".to_string(), layer);
        }
        let active_color = self
            .router
            .resolve(override_color.as_ref(), Some(&global.active_color));

        // Variant color is part of the immutable Deployment selector; it never follows the active color
        let color = match &spec.color {
            Some(raw) => {
                f.origins.insert("color".to_string(), Layer::App);
                parse_color(&mut f, "color", raw).unwrap_or_default()
            }
            None => f.builtin("color", Color::default()),
        };

        let origins = f.origins.clone();
        let resolved = ResolvedApp {
            index,
            name: spec.name.clone(),
            namespace,
            app_label,
            replicas,
            image,
            command,
            ports,
            startup_probe,
            resources,
            env_from,
            env: spec.env.clone(),
            service,
            hpa,
            active_color,
            color,
            image_pull_secrets: global.image_pull_secrets.clone(),
            origins,
        };

        if f.errors.is_empty() {
            debug!(
                app = %resolved.name,
                namespace = %resolved.namespace,
                color = %resolved.color,
                active_color = %resolved.active_color,
                service = resolved.service.is_some(),
                hpa = resolved.hpa.is_some(),
                "resolved application"
            );
        }

        f.finish(resolved)
    }

    fn resolve_image(&self, stack: &SettingsStack<'a>, f: &mut Findings) -> ResolvedImage {
        let registry = f.take("image.registry", stack.pick(|s| s.image.registry.as_ref()));
        let repository = f.take("image.repository", stack.pick(|s| s.image.repository.as_ref()));
        let name = f
            .take("image.name", stack.pick(|s| s.image.name.as_ref()))
            .filter(|n| !n.is_empty());
        let tag = f
            .take("image.tag", stack.pick(|s| s.image.tag.as_ref()))
            .filter(|t| !t.is_empty());

        if name.is_none() {
            f.error_with_help(
                "image.name",
                "is required",
                "set `image.name` on the app, the environment or `global.image`".to_string(),
            );
        }
        if tag.is_none() {
            f.error_with_help(
                "image.tag",
                "is required",
                "set `image.tag` on the app, the environment or `global.image`".to_string(),
            );
        }

        let pull_policy = match f.take("image.pullPolicy", stack.pick(|s| s.image.pull_policy.as_ref())) {
            Some(raw) => PullPolicy::parse(&raw).unwrap_or_else(|| {
                f.error_with_help(
                    "image.pullPolicy",
                    format!("`{}` is not a valid pull policy", raw),
                    suggest_enum_value(&raw, PullPolicy::ALLOWED),
                );
                PullPolicy::default()
            }),
            None => f.builtin("image.pullPolicy", PullPolicy::default()),
        };

        let path: Vec<&str> = [registry.as_deref(), repository.as_deref(), name.as_deref()]
            .into_iter()
            .flatten()
            .map(|part| part.trim_matches('/'))
            .filter(|part| !part.is_empty())
            .collect();
        let reference = format!("{}:{}", path.join("/"), tag.unwrap_or_default());

        ResolvedImage {
            reference,
            pull_policy,
        }
    }
}

fn parse_color(f: &mut Findings, field: &str, raw: &str) -> Option<Color> {
    let color = Color::parse(raw);
    if color.is_none() {
        f.error_with_help(
            field,
            format!("`{}` is not a valid color", raw),
            "colors are label values such as `blue` or `green`".to_string(),
        );
    }
    color
}

fn check_port(f: &mut Findings, field: &str, value: Option<i32>) {
    if let Some(port) = value
        && !(1..=65535).contains(&port)
    {
        f.error(field, format!("must be between 1 and 65535, got {}", port));
    }
}

fn resolve_ports(spec: &AppSpec, f: &mut Findings) -> ResolvedPorts {
    let Some(raw) = &spec.ports else {
        return ResolvedPorts::default();
    };
    f.origins.insert("ports".to_string(), Layer::App);

    check_port(f, "ports.port", raw.port);
    check_port(f, "ports.targetPort", raw.target_port);
    check_port(f, "ports.grpcPort", raw.grpc_port);
    if let Some(node_port) = raw.node_port
        && !(1..=65535).contains(&node_port)
    {
        f.error(
            "ports.nodePort",
            format!("must be between 1 and 65535, got {}", node_port),
        );
    }

    ResolvedPorts {
        port: raw.port,
        target_port: raw.target_port.or(raw.port),
        grpc_port: raw.grpc_port,
        node_port: raw.node_port,
    }
}

fn resolve_service(spec: &AppSpec, ports: &ResolvedPorts, f: &mut Findings) -> Option<ServiceType> {
    let config = spec.service.as_ref()?;
    f.origins.insert("service".to_string(), Layer::App);

    let service_type = match config.service_type.as_deref() {
        None => ServiceType::ClusterIP,
        Some(raw) => match ServiceType::parse(raw) {
            Some(t) => t,
            None => {
                f.error_with_help(
                    "service.type",
                    format!("`{}` is not a supported service type", raw),
                    suggest_enum_value(raw, ServiceType::ALLOWED),
                );
                return None;
            }
        },
    };

    if ports.port.is_none() {
        f.error_with_help(
            "ports.port",
            "is required when a service is declared",
            "set `ports.port` or use `service: null`".to_string(),
        );
    }
    if ports.node_port.is_some() && service_type == ServiceType::ClusterIP {
        f.error_with_help(
            "ports.nodePort",
            "cannot be used with a ClusterIP service",
            "use `service.type: NodePort` or `LoadBalancer`".to_string(),
        );
    }

    Some(service_type)
}

fn resolve_probe(
    probe: &StartupProbeConfig,
    ports: &ResolvedPorts,
    f: &mut Findings,
) -> Option<ResolvedProbe> {
    if !probe.enabled {
        return None;
    }

    let initial_delay_seconds = probe
        .initial_delay_seconds
        .unwrap_or(defaults::PROBE_INITIAL_DELAY_SECONDS);
    if initial_delay_seconds < 0 {
        f.error(
            "startupProbe.initialDelaySeconds",
            format!("must be >= 0, got {}", initial_delay_seconds),
        );
    }

    let mut at_least_one = |field: &str, value: Option<i32>, default: i32| {
        let value = value.unwrap_or(default);
        if value < 1 {
            f.error(field, format!("must be >= 1, got {}", value));
        }
        value
    };
    let period_seconds = at_least_one(
        "startupProbe.periodSeconds",
        probe.period_seconds,
        defaults::PROBE_PERIOD_SECONDS,
    );
    let timeout_seconds = at_least_one(
        "startupProbe.timeoutSeconds",
        probe.timeout_seconds,
        defaults::PROBE_TIMEOUT_SECONDS,
    );
    let failure_threshold = at_least_one(
        "startupProbe.failureThreshold",
        probe.failure_threshold,
        defaults::PROBE_FAILURE_THRESHOLD,
    );

    let Some(port) = ports.target_port else {
        f.error_with_help(
            "startupProbe",
            "needs a port to probe",
            "set `ports.targetPort` or `ports.port`".to_string(),
        );
        return None;
    };

    Some(ResolvedProbe {
        path: probe.path.clone().filter(|p| !p.is_empty()),
        port,
        initial_delay_seconds,
        period_seconds,
        timeout_seconds,
        failure_threshold,
    })
}

fn check_quantity(f: &mut Findings, field: &str, value: Option<&String>) {
    if let Some(q) = value
        && !QUANTITY.is_match(q)
    {
        f.error_with_help(
            field,
            format!("`{}` is not a valid quantity", q),
            "use values such as `100m`, `0.5`, `256Mi` or `1Gi`".to_string(),
        );
    }
}

fn resolve_resources(block: &ResourceConfig, f: &mut Findings) -> Option<ResolvedResources> {
    if !block.enabled {
        return None;
    }

    check_quantity(f, "resources.requests.cpu", block.requests.cpu.as_ref());
    check_quantity(f, "resources.requests.memory", block.requests.memory.as_ref());
    check_quantity(f, "resources.limits.cpu", block.limits.cpu.as_ref());
    check_quantity(f, "resources.limits.memory", block.limits.memory.as_ref());

    if block.requests.is_empty() && block.limits.is_empty() {
        f.error("resources", "is enabled but sets no requests or limits");
    }

    Some(ResolvedResources {
        requests: block.requests.clone(),
        limits: block.limits.clone(),
    })
}

fn resolve_hpa(
    block: &HpaConfig,
    resources: Option<&ResolvedResources>,
    f: &mut Findings,
) -> Option<ResolvedHpa> {
    if !block.enabled {
        return None;
    }

    let min_replicas = block.min_replicas.unwrap_or(defaults::HPA_MIN_REPLICAS);
    if min_replicas < 1 {
        f.error("hpa.minReplicas", format!("must be >= 1, got {}", min_replicas));
    }

    let max_replicas = match block.max_replicas {
        Some(max) => max,
        None => {
            f.error("hpa.maxReplicas", "is required when the autoscaler is enabled");
            min_replicas
        }
    };
    if block.max_replicas.is_some() && max_replicas < min_replicas {
        f.error(
            "hpa.maxReplicas",
            format!(
                "must be >= minReplicas ({}), got {}",
                min_replicas, max_replicas
            ),
        );
    }

    let (target_cpu, target_memory) = match (
        block.target_cpu_utilization_percentage,
        block.target_memory_utilization_percentage,
    ) {
        (None, None) => (Some(defaults::HPA_CPU_TARGET), None),
        targets => targets,
    };
    for (field, target) in [
        ("hpa.targetCPUUtilizationPercentage", target_cpu),
        ("hpa.targetMemoryUtilizationPercentage", target_memory),
    ] {
        if let Some(t) = target
            && t < 1
        {
            f.error(field, format!("must be >= 1, got {}", t));
        }
    }

    match resources {
        None => f.error_with_help(
            "hpa",
            "requires resources to be enabled",
            "utilization targets are relative to resource requests; set `resources.enabled: true`"
                .to_string(),
        ),
        Some(r) => {
            if target_cpu.is_some() && r.requests.cpu.is_none() {
                f.error("hpa", "a CPU target requires `resources.requests.cpu`");
            }
            if target_memory.is_some() && r.requests.memory.is_none() {
                f.error("hpa", "a memory target requires `resources.requests.memory`");
            }
        }
    }

    Some(ResolvedHpa {
        min_replicas,
        max_replicas,
        target_cpu,
        target_memory,
    })
}

fn check_env(env: &[EnvEntry], f: &mut Findings) {
    let mut seen = HashSet::new();
    for (i, entry) in env.iter().enumerate() {
        let field = format!("env[{}].name", i);
        if entry.name.is_empty() {
            f.error(&field, "is required");
        } else if !seen.insert(entry.name.as_str()) {
            let names: Vec<&str> = env.iter().map(|e| e.name.as_str()).collect();
            let hint = suggest_name(&entry.name, &names)
                .unwrap_or_else(|| "remove the duplicate entry".to_string());
            f.error_with_help(&field, format!("`{}` is defined twice", entry.name), hint);
        }
    }
}
