//! Workload synthesis (`apps/v1 Deployment`)
//!
//! One Deployment per application, always. Its selector and pod labels carry
//! the workload's own variant color, never the active one, so switching
//! traffic between colors leaves the pod template untouched.

use fleetpack_core::ResolvedApp;
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStrategy, RollingUpdateDeployment,
};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvFromSource, EnvVar, HTTPGetAction, LocalObjectReference, PodSpec,
    PodTemplateSpec, Probe, ResourceRequirements, SecretEnvSource, TCPSocketAction,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::meta::{SynthContext, object_meta};

/// Pod annotation holding the digest of the literal environment
pub const ENV_CHECKSUM_ANNOTATION: &str = "fleetpack.io/env-checksum";

const MAX_SURGE: &str = "25%";
const MAX_UNAVAILABLE: &str = "25%";

/// Build the Deployment for one application
pub fn deployment(app: &ResolvedApp, ctx: &SynthContext<'_>) -> Deployment {
    let name = ctx.app_object_name(app);

    let mut labels = ctx.app_labels(app);
    let fragment = ctx.router.selector(&app.color);
    labels.insert(fragment.key, fragment.value);

    let selector = ctx.selector(app, &app.color);

    // Pod labels: canonical labels and the selector, without the active color
    let mut pod_labels = ctx.names.labels();
    pod_labels.extend(selector.clone());

    tracing::trace!(app = %app.name, deployment = %name, color = %app.color, "synthesizing deployment");

    Deployment {
        metadata: object_meta(name, &app.namespace, labels),
        spec: Some(DeploymentSpec {
            replicas: Some(app.replicas),
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            strategy: Some(DeploymentStrategy {
                type_: Some("RollingUpdate".to_string()),
                rolling_update: Some(RollingUpdateDeployment {
                    max_surge: Some(IntOrString::String(MAX_SURGE.to_string())),
                    max_unavailable: Some(IntOrString::String(MAX_UNAVAILABLE.to_string())),
                }),
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    annotations: Some(BTreeMap::from([(
                        ENV_CHECKSUM_ANNOTATION.to_string(),
                        env_checksum(app),
                    )])),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container(app)],
                    image_pull_secrets: if app.image_pull_secrets.is_empty() {
                        None
                    } else {
                        Some(
                            app.image_pull_secrets
                                .iter()
                                .map(|name| LocalObjectReference { name: name.clone() })
                                .collect(),
                        )
                    },
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn container(app: &ResolvedApp) -> Container {
    let mut ports = Vec::new();
    if let Some(target) = app.ports.target_port {
        ports.push(ContainerPort {
            name: Some("http".to_string()),
            container_port: target,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        });
    }
    if let Some(grpc) = app.ports.grpc_port {
        ports.push(ContainerPort {
            name: Some("grpc".to_string()),
            container_port: grpc,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        });
    }

    let env: Vec<EnvVar> = app
        .env
        .iter()
        .map(|entry| EnvVar {
            name: entry.name.clone(),
            value: Some(entry.value.clone()),
            ..Default::default()
        })
        .collect();

    Container {
        name: app.name.clone(),
        image: Some(app.image.reference.clone()),
        image_pull_policy: Some(app.image.pull_policy.as_str().to_string()),
        command: app.command.clone(),
        ports: (!ports.is_empty()).then_some(ports),
        env: (!env.is_empty()).then_some(env),
        env_from: app.env_from.as_ref().map(|secret| {
            vec![EnvFromSource {
                secret_ref: Some(SecretEnvSource {
                    name: secret.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            }]
        }),
        startup_probe: app.startup_probe.as_ref().map(|probe| Probe {
            http_get: probe.path.as_ref().map(|path| HTTPGetAction {
                path: Some(path.clone()),
                port: IntOrString::Int(probe.port),
                ..Default::default()
            }),
            tcp_socket: match probe.path {
                Some(_) => None,
                None => Some(TCPSocketAction {
                    port: IntOrString::Int(probe.port),
                    ..Default::default()
                }),
            },
            initial_delay_seconds: Some(probe.initial_delay_seconds),
            period_seconds: Some(probe.period_seconds),
            timeout_seconds: Some(probe.timeout_seconds),
            failure_threshold: Some(probe.failure_threshold),
            ..Default::default()
        }),
        resources: app.resources.as_ref().map(|r| ResourceRequirements {
            requests: quantities(r.requests.cpu.as_ref(), r.requests.memory.as_ref()),
            limits: quantities(r.limits.cpu.as_ref(), r.limits.memory.as_ref()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn quantities(cpu: Option<&String>, memory: Option<&String>) -> Option<BTreeMap<String, Quantity>> {
    let map: BTreeMap<String, Quantity> = [("cpu", cpu), ("memory", memory)]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), Quantity(v.clone()))))
        .collect();
    (!map.is_empty()).then_some(map)
}

/// SHA-256 over the literal env entries and the env secret reference
pub fn env_checksum(app: &ResolvedApp) -> String {
    let mut hasher = Sha256::new();
    for entry in &app.env {
        hasher.update(entry.name.as_bytes());
        hasher.update(b"=");
        hasher.update(entry.value.as_bytes());
        hasher.update(b"\n");
    }
    if let Some(secret) = &app.env_from {
        hasher.update(b"envFrom:");
        hasher.update(secret.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
