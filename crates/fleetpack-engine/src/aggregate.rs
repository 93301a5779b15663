//! Aggregation: cross-entry checks and output ordering
//!
//! Output order is fixed: per application in declaration order its
//! Deployment, Service and HPA, then the Ingress, then the access-control
//! set.

use fleetpack_core::error::app_subject;
use fleetpack_core::{ChartValues, RenderError, Resolution};
use indexmap::{IndexMap, IndexSet};
use indexmap::map::Entry;

use crate::access::access_control;
use crate::autoscaler::autoscaler;
use crate::ingress::{AppDirectory, AppEntry, ingress};
use crate::manifest::{Manifest, ManifestSet, Resource};
use crate::meta::SynthContext;
use crate::service::service;
use crate::workload::deployment;

/// Manifests together with every error found while producing them
#[derive(Debug, Default)]
pub struct Aggregation {
    pub manifests: ManifestSet,
    pub errors: Vec<RenderError>,
}

impl Aggregation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Duplicate application names, reported against the first declaration
pub fn duplicate_apps(values: &ChartValues) -> Vec<RenderError> {
    let mut seen: IndexMap<&str, usize> = IndexMap::new();
    let mut errors = Vec::new();

    for (index, app) in values.apps.iter().enumerate() {
        if app.name.is_empty() {
            continue;
        }
        match seen.entry(app.name.as_str()) {
            Entry::Occupied(first) => errors.push(RenderError::conflict(
                "application name",
                app.name.clone(),
                app_subject(*first.get(), &app.name),
                app_subject(index, &app.name),
            )),
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
        }
    }

    errors
}

/// Objects of one kind sharing a name within a namespace
pub fn name_collisions(manifests: &ManifestSet) -> Vec<RenderError> {
    let mut seen: IndexMap<(&str, Option<&str>, &str), &str> = IndexMap::new();
    let mut errors = Vec::new();

    for manifest in manifests {
        let key = (manifest.kind(), manifest.namespace(), manifest.name());
        match seen.entry(key) {
            Entry::Occupied(first) => errors.push(RenderError::conflict(
                format!("{} name", manifest.kind()),
                manifest.name(),
                *first.get(),
                manifest.source.as_str(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(manifest.source.as_str());
            }
        }
    }

    errors
}

/// Synthesize every object of a resolved input and run the cross-entry checks
///
/// Errors from resolution are carried over. Apps that failed to resolve
/// produce nothing, and Ingress backends pointing at them are not reported
/// again.
pub fn aggregate(
    values: &ChartValues,
    resolution: &Resolution,
    ctx: &SynthContext<'_>,
) -> Aggregation {
    let mut errors = resolution.errors();
    errors.extend(duplicate_apps(values));

    let mut directory = AppDirectory::new();
    for (spec, resolved) in values.apps.iter().zip(&resolution.apps) {
        let entry = match resolved {
            Ok(app) => AppEntry::Resolved(app),
            Err(_) => AppEntry::Unresolved,
        };
        directory.insert(spec.name.as_str(), entry);
    }

    let mut manifests = Vec::new();
    let mut emitted: IndexSet<&str> = IndexSet::new();

    for app in resolution.apps.iter().filter_map(|r| r.as_ref().ok()) {
        // Duplicates are already reported; only the first declaration emits
        if !emitted.insert(app.name.as_str()) {
            continue;
        }

        manifests.push(Manifest::new(
            format!("{}/deployment.yaml", app.name),
            Resource::Deployment(deployment(app, ctx)),
        ));
        if let Some(svc) = service(app, ctx) {
            manifests.push(Manifest::new(
                format!("{}/service.yaml", app.name),
                Resource::Service(svc),
            ));
        }
        if let Some(hpa) = autoscaler(app, ctx) {
            manifests.push(Manifest::new(
                format!("{}/hpa.yaml", app.name),
                Resource::HorizontalPodAutoscaler(hpa),
            ));
        }
    }

    if let Some(spec) = &values.ingress {
        match ingress(spec, &directory, ctx) {
            Ok(Some(object)) => manifests.push(Manifest::new("ingress.yaml", Resource::Ingress(object))),
            Ok(None) => {}
            Err(e) => errors.extend(e),
        }
    }

    match access_control(&values.rbac, ctx) {
        Ok(Some(set)) => {
            manifests.push(Manifest::new(
                "rbac/serviceaccount.yaml",
                Resource::ServiceAccount(set.service_account),
            ));
            manifests.push(Manifest::new("rbac/role.yaml", Resource::Role(set.role)));
            manifests.push(Manifest::new(
                "rbac/rolebinding.yaml",
                Resource::RoleBinding(set.role_binding),
            ));
            manifests.push(Manifest::new(
                "rbac/token-secret.yaml",
                Resource::Secret(set.token_secret),
            ));
        }
        Ok(None) => {}
        Err(e) => errors.extend(e),
    }

    let manifests = ManifestSet::new(manifests);
    errors.extend(name_collisions(&manifests));

    tracing::debug!(
        manifests = manifests.len(),
        errors = errors.len(),
        "aggregated render output"
    );

    Aggregation { manifests, errors }
}
