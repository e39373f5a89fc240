//! Resource transformers
//!
//! A transformer claims objects by exact group/version/kind and rewrites
//! them into a templated [`Fragment`]. The set is closed: each variant of
//! [`Transformer`] is one kind family, and [`Transformer::DEFAULT_ORDER`]
//! is the registration order the dispatcher tries them in. Kinds never
//! overlap between variants; [`check_overlap`] enforces that for custom
//! orders.

use chartify_core::{AppMetadata, ChartInfo, Values};
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use std::collections::HashMap;

use crate::error::{ConvertError, Result};
use crate::object::{GroupVersionKind, Object, ResourceKind};

pub mod configmap;
pub mod crd;
pub mod meta;
pub mod pod;
pub mod rbac;
pub mod secret;
pub mod security_context;
pub mod service;
pub mod webhook;
pub mod workload;

/// One object's templated output
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// File name under `templates/`
    pub output_name: String,
    /// Templated YAML text
    pub text: String,
    /// Values extracted from the object
    pub values: Values,
}

impl Fragment {
    pub fn new(output_name: impl Into<String>, text: String, values: Values) -> Self {
        Self {
            output_name: output_name.into(),
            text,
            values,
        }
    }

    /// Verbatim copy of an object no transformer claimed
    pub fn pass_through(app_meta: &AppMetadata, obj: &Object) -> Result<Self> {
        let trimmed = app_meta.trim_name(obj.name());
        let output_name = file_name(&trimmed, &obj.kind().to_ascii_lowercase());
        Ok(Self::new(
            output_name,
            crate::yaml::marshal_map(obj.data(), 0)?,
            Values::new(),
        ))
    }
}

/// `<name>-<suffix>.yaml`, without repeating a suffix the name already ends with
pub(crate) fn file_name(name: &str, suffix: &str) -> String {
    let base = if name.is_empty() { suffix } else { name };
    if base == suffix || base.ends_with(&format!("-{}", suffix)) {
        format!("{}.yaml", base)
    } else {
        format!("{}-{}.yaml", base, suffix)
    }
}

const CONFIG_MAP_KINDS: &[ResourceKind] = &[ResourceKind::of::<ConfigMap>()];
const CRD_KINDS: &[ResourceKind] = &[ResourceKind::of::<CustomResourceDefinition>()];
const WORKLOAD_KINDS: &[ResourceKind] = &[
    ResourceKind::of::<Deployment>(),
    ResourceKind::of::<StatefulSet>(),
    ResourceKind::of::<DaemonSet>(),
];
const SERVICE_KINDS: &[ResourceKind] = &[ResourceKind::of::<Service>()];
const CLUSTER_ROLE_BINDING_KINDS: &[ResourceKind] = &[ResourceKind::of::<ClusterRoleBinding>()];
const ROLE_KINDS: &[ResourceKind] = &[ResourceKind::of::<Role>(), ResourceKind::of::<ClusterRole>()];
const ROLE_BINDING_KINDS: &[ResourceKind] = &[ResourceKind::of::<RoleBinding>()];
const SERVICE_ACCOUNT_KINDS: &[ResourceKind] = &[ResourceKind::of::<ServiceAccount>()];
const SECRET_KINDS: &[ResourceKind] = &[ResourceKind::of::<Secret>()];
const ISSUER_KINDS: &[ResourceKind] = &[
    ResourceKind::new("cert-manager.io", "v1", "Issuer"),
    ResourceKind::new("cert-manager.io", "v1", "ClusterIssuer"),
];
const CERTIFICATE_KINDS: &[ResourceKind] = &[ResourceKind::new("cert-manager.io", "v1", "Certificate")];
const WEBHOOK_KINDS: &[ResourceKind] = &[
    ResourceKind::of::<MutatingWebhookConfiguration>(),
    ResourceKind::of::<ValidatingWebhookConfiguration>(),
];

/// Closed set of transformers, one per kind family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transformer {
    ConfigMap,
    CustomResourceDefinition,
    Workload,
    Service,
    ClusterRoleBinding,
    Role,
    RoleBinding,
    ServiceAccount,
    Secret,
    Issuer,
    Certificate,
    Webhook,
}

impl Transformer {
    /// Registration order; the first matching transformer claims an object
    pub const DEFAULT_ORDER: [Transformer; 12] = [
        Transformer::ConfigMap,
        Transformer::CustomResourceDefinition,
        Transformer::Workload,
        Transformer::Service,
        Transformer::ClusterRoleBinding,
        Transformer::Role,
        Transformer::RoleBinding,
        Transformer::ServiceAccount,
        Transformer::Secret,
        Transformer::Issuer,
        Transformer::Certificate,
        Transformer::Webhook,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfigMap => "configmap",
            Self::CustomResourceDefinition => "crd",
            Self::Workload => "workload",
            Self::Service => "service",
            Self::ClusterRoleBinding => "clusterrolebinding",
            Self::Role => "role",
            Self::RoleBinding => "rolebinding",
            Self::ServiceAccount => "serviceaccount",
            Self::Secret => "secret",
            Self::Issuer => "issuer",
            Self::Certificate => "certificate",
            Self::Webhook => "webhook",
        }
    }

    /// Kinds this transformer claims
    pub fn kinds(&self) -> &'static [ResourceKind] {
        match self {
            Self::ConfigMap => CONFIG_MAP_KINDS,
            Self::CustomResourceDefinition => CRD_KINDS,
            Self::Workload => WORKLOAD_KINDS,
            Self::Service => SERVICE_KINDS,
            Self::ClusterRoleBinding => CLUSTER_ROLE_BINDING_KINDS,
            Self::Role => ROLE_KINDS,
            Self::RoleBinding => ROLE_BINDING_KINDS,
            Self::ServiceAccount => SERVICE_ACCOUNT_KINDS,
            Self::Secret => SECRET_KINDS,
            Self::Issuer => ISSUER_KINDS,
            Self::Certificate => CERTIFICATE_KINDS,
            Self::Webhook => WEBHOOK_KINDS,
        }
    }

    /// Exact group/version/kind match, no wildcards
    pub fn matches(&self, gvk: &GroupVersionKind) -> bool {
        self.kinds().iter().any(|kind| kind.matches(gvk))
    }

    /// Whether names of claimed objects feed application name detection
    ///
    /// CRD names are `<plural>.<group>` and share no prefix with the
    /// application's objects.
    pub fn names_application(&self) -> bool {
        !matches!(self, Self::CustomResourceDefinition)
    }

    /// Rewrite a claimed object into a fragment
    pub fn transform(
        &self,
        info: &ChartInfo,
        app_meta: &AppMetadata,
        obj: &Object,
    ) -> Result<Fragment> {
        match self {
            Self::ConfigMap => configmap::transform(info, app_meta, obj),
            Self::CustomResourceDefinition => crd::transform(info, app_meta, obj),
            Self::Workload => workload::transform(info, app_meta, obj),
            Self::Service => service::transform(info, app_meta, obj),
            Self::ClusterRoleBinding => rbac::cluster_role_binding(info, app_meta, obj),
            Self::Role => rbac::role(info, app_meta, obj),
            Self::RoleBinding => rbac::role_binding(info, app_meta, obj),
            Self::ServiceAccount => rbac::service_account(info, app_meta, obj),
            Self::Secret => secret::transform(info, app_meta, obj),
            Self::Issuer => webhook::issuer(info, app_meta, obj),
            Self::Certificate => webhook::certificate(info, app_meta, obj),
            Self::Webhook => webhook::webhook_configuration(info, app_meta, obj),
        }
    }
}

impl std::fmt::Display for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject an ordering in which two transformers claim the same kind
pub fn check_overlap(transformers: &[Transformer]) -> Result<()> {
    let mut claimed: HashMap<ResourceKind, Transformer> = HashMap::new();
    for transformer in transformers {
        for kind in transformer.kinds() {
            if let Some(previous) = claimed.insert(*kind, *transformer) {
                tracing::debug!(%kind, first = %previous, second = %transformer, "overlapping transformers");
                return Err(ConvertError::OverlappingTransformers {
                    kind: kind.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_has_no_overlap() {
        assert!(check_overlap(&Transformer::DEFAULT_ORDER).is_ok());
    }

    #[test]
    fn test_duplicate_registration_is_overlap() {
        let err = check_overlap(&[Transformer::Workload, Transformer::Service, Transformer::Workload])
            .unwrap_err();
        assert!(matches!(err, ConvertError::OverlappingTransformers { .. }));
        assert!(err.to_string().contains("apps/v1/Deployment"));
    }

    #[test]
    fn test_matches_exact_kind() {
        let deployment = GroupVersionKind::from_api_version("apps/v1", "Deployment");
        let service = GroupVersionKind::from_api_version("v1", "Service");
        let knative = GroupVersionKind::from_api_version("serving.knative.dev/v1", "Service");

        assert!(Transformer::Workload.matches(&deployment));
        assert!(!Transformer::Service.matches(&deployment));
        assert!(Transformer::Service.matches(&service));
        assert!(!Transformer::Service.matches(&knative));
    }

    #[test]
    fn test_every_kind_has_one_owner() {
        let certificate = GroupVersionKind::from_api_version("cert-manager.io/v1", "Certificate");
        let owners: Vec<_> = Transformer::DEFAULT_ORDER
            .iter()
            .filter(|t| t.matches(&certificate))
            .collect();
        assert_eq!(owners, vec![&Transformer::Certificate]);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("controller-manager", "deployment"), "controller-manager-deployment.yaml");
        assert_eq!(file_name("webhook-service", "service"), "webhook-service.yaml");
        assert_eq!(file_name("service", "service"), "service.yaml");
        assert_eq!(file_name("", "configmap"), "configmap.yaml");
    }
}
