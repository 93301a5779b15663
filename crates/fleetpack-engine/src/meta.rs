//! Shared input of the synthesizers: names, labels and object metadata

use fleetpack_core::naming::{LABEL_ACTIVE_COLOR, LABEL_APP};
use fleetpack_core::{Color, ColorRouter, NameGenerator, ResolvedApp, ResolvedGlobal};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Read-only state every synthesizer sees during one render
#[derive(Debug, Clone, Copy)]
pub struct SynthContext<'a> {
    pub names: &'a NameGenerator,
    pub router: &'a ColorRouter,
    pub global: &'a ResolvedGlobal,
}

impl<'a> SynthContext<'a> {
    pub fn new(names: &'a NameGenerator, router: &'a ColorRouter, global: &'a ResolvedGlobal) -> Self {
        Self {
            names,
            router,
            global,
        }
    }

    /// Name of every object derived from one application
    pub fn app_object_name(&self, app: &ResolvedApp) -> String {
        self.names.object_name(&app.name)
    }

    /// Canonical labels plus the active color
    pub fn labels(&self, active: &Color) -> BTreeMap<String, String> {
        let mut labels = self.names.labels();
        labels.insert(LABEL_ACTIVE_COLOR.to_string(), active.to_string());
        labels
    }

    /// Labels of release-wide objects (ingress, access control)
    pub fn release_labels(&self) -> BTreeMap<String, String> {
        self.labels(&self.global.active_color)
    }

    /// Labels of objects derived from one application
    pub fn app_labels(&self, app: &ResolvedApp) -> BTreeMap<String, String> {
        let mut labels = self.labels(&app.active_color);
        labels.insert(LABEL_APP.to_string(), app.app_label.clone());
        labels
    }

    /// `app` plus the color fragment for `color`
    pub fn selector(&self, app: &ResolvedApp, color: &Color) -> BTreeMap<String, String> {
        let fragment = self.router.selector(color);
        BTreeMap::from([
            (LABEL_APP.to_string(), app.app_label.clone()),
            (fragment.key, fragment.value),
        ])
    }
}

pub fn object_meta(name: String, namespace: &str, labels: BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(namespace.to_string()),
        labels: Some(labels),
        ..Default::default()
    }
}
