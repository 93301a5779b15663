//! Access-control synthesis
//!
//! A ServiceAccount for the deployer, a Role over the kinds this engine
//! emits, a RoleBinding tying them together (and optionally a group), and a
//! long-lived token Secret for the account.

use fleetpack_core::config::{AccessControlSpec, PolicyRuleSpec};
use fleetpack_core::naming::is_dns_label;
use fleetpack_core::resolve::Resolved;
use fleetpack_core::RenderError;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use std::collections::BTreeMap;

use crate::meta::{SynthContext, object_meta};

pub const TOKEN_SECRET_TYPE: &str = "kubernetes.io/service-account-token";
pub const SERVICE_ACCOUNT_NAME_ANNOTATION: &str = "kubernetes.io/service-account.name";

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

const WRITE_VERBS: &[&str] = &["get", "list", "watch", "create", "update", "patch", "delete"];
const READ_VERBS: &[&str] = &["get", "list", "watch"];

/// The four access-control objects, in output order
#[derive(Debug, Clone, PartialEq)]
pub struct AccessControlSet {
    pub service_account: ServiceAccount,
    pub role: Role,
    pub role_binding: RoleBinding,
    pub token_secret: Secret,
}

/// Rules granting management of everything a render produces
pub fn default_rules() -> Vec<PolicyRuleSpec> {
    let rule = |groups: &[&str], resources: &[&str], verbs: &[&str]| PolicyRuleSpec {
        api_groups: groups.iter().map(|s| s.to_string()).collect(),
        resources: resources.iter().map(|s| s.to_string()).collect(),
        verbs: verbs.iter().map(|s| s.to_string()).collect(),
    };

    vec![
        rule(&["apps"], &["deployments"], WRITE_VERBS),
        rule(&[""], &["services", "serviceaccounts", "secrets"], WRITE_VERBS),
        rule(&["autoscaling"], &["horizontalpodautoscalers"], WRITE_VERBS),
        rule(&["networking.k8s.io"], &["ingresses"], WRITE_VERBS),
        rule(&[RBAC_API_GROUP], &["roles", "rolebindings"], WRITE_VERBS),
        rule(&[""], &["pods"], READ_VERBS),
    ]
}

/// Build the access-control set, or `None` when disabled
pub fn access_control(
    spec: &AccessControlSpec,
    ctx: &SynthContext<'_>,
) -> Resolved<Option<AccessControlSet>> {
    if !spec.enabled {
        return Ok(None);
    }

    let mut errors = Vec::new();
    let mut name_for = |field: &str, configured: &Option<String>, suffix: &str| match configured {
        Some(name) => {
            if !is_dns_label(name) {
                errors.push(RenderError::schema(
                    "rbac",
                    field,
                    format!("`{}` is not a valid object name", name),
                ));
            }
            name.clone()
        }
        None => ctx.names.object_name(suffix),
    };

    let account = name_for("serviceAccountName", &spec.service_account_name, "sa");
    let role_name = name_for("roleName", &spec.role_name, "role");
    let binding_name = name_for("roleBindingName", &spec.role_binding_name, "rolebinding");
    let token_name = name_for("tokenSecretName", &spec.token_secret_name, "token");

    let rules = if spec.rules.is_empty() {
        default_rules()
    } else {
        spec.rules.clone()
    };
    for (index, rule) in rules.iter().enumerate() {
        if rule.verbs.is_empty() {
            errors.push(RenderError::schema(
                "rbac",
                format!("rules[{}].verbs", index),
                "must not be empty",
            ));
        }
        if rule.resources.is_empty() {
            errors.push(RenderError::schema(
                "rbac",
                format!("rules[{}].resources", index),
                "must not be empty",
            ));
        }
    }

    if let Some(group) = &spec.subject_group
        && group.is_empty()
    {
        errors.push(RenderError::schema("rbac", "subjectGroup", "must not be empty"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let namespace = &ctx.global.namespace;
    let labels = ctx.release_labels();

    let service_account = ServiceAccount {
        metadata: object_meta(account.clone(), namespace, labels.clone()),
        ..Default::default()
    };

    let role = Role {
        metadata: object_meta(role_name.clone(), namespace, labels.clone()),
        rules: Some(
            rules
                .into_iter()
                .map(|r| PolicyRule {
                    api_groups: Some(r.api_groups),
                    resources: Some(r.resources),
                    verbs: r.verbs,
                    ..Default::default()
                })
                .collect(),
        ),
    };

    let mut subjects = vec![Subject {
        kind: "ServiceAccount".to_string(),
        name: account.clone(),
        namespace: Some(namespace.clone()),
        ..Default::default()
    }];
    if let Some(group) = &spec.subject_group {
        subjects.push(Subject {
            kind: "Group".to_string(),
            name: group.clone(),
            api_group: Some(RBAC_API_GROUP.to_string()),
            ..Default::default()
        });
    }

    let role_binding = RoleBinding {
        metadata: object_meta(binding_name, namespace, labels.clone()),
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "Role".to_string(),
            name: role_name,
        },
        subjects: Some(subjects),
    };

    let mut secret_meta = object_meta(token_name, namespace, labels);
    secret_meta.annotations = Some(BTreeMap::from([(
        SERVICE_ACCOUNT_NAME_ANNOTATION.to_string(),
        account,
    )]));
    let token_secret = Secret {
        metadata: secret_meta,
        type_: Some(TOKEN_SECRET_TYPE.to_string()),
        ..Default::default()
    };

    Ok(Some(AccessControlSet {
        service_account,
        role,
        role_binding,
        token_secret,
    }))
}
