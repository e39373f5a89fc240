//! RBAC transformers: roles, bindings and service accounts
//!
//! Bindings are structural and contribute no values. The bound role and
//! every subject go through the naming service, and subjects are moved to
//! the release namespace. Roles and their bindings share one
//! `<name>-rbac.yaml` file.

use chartify_core::{AppMetadata, ChartInfo, RELEASE_NAMESPACE, Values};
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding, RoleRef, Subject};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{ConvertError, Result};
use crate::object::Object;
use crate::processor::{Fragment, file_name, meta};
use crate::unstructured::{JsonMap, objects_mut, template_name};
use crate::yaml::marshal_map;

pub fn cluster_role_binding(
    info: &ChartInfo,
    app_meta: &AppMetadata,
    obj: &Object,
) -> Result<Fragment> {
    let binding: ClusterRoleBinding = typed(obj)?;
    binding_fragment(info, app_meta, obj, binding.role_ref, binding.subjects)
}

pub fn role_binding(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let binding: RoleBinding = typed(obj)?;
    binding_fragment(info, app_meta, obj, binding.role_ref, binding.subjects)
}

/// Role and ClusterRole; rules are copied verbatim
pub fn role(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let mut text = meta::render(info, app_meta, obj)?;
    let body = obj.body();
    if !body.is_empty() {
        text.push_str(&marshal_map(&body, 0)?);
    }
    Ok(Fragment::new(
        rbac_file_name(app_meta, obj.name(), "-role"),
        text,
        Values::new(),
    ))
}

pub fn service_account(
    info: &ChartInfo,
    app_meta: &AppMetadata,
    obj: &Object,
) -> Result<Fragment> {
    let mut text = meta::render(info, app_meta, obj)?;
    let mut body = obj.body();
    for field in ["secrets", "imagePullSecrets"] {
        for reference in objects_mut(&mut body, field, "")? {
            template_name(reference, "name", field, app_meta)?;
        }
    }
    if !body.is_empty() {
        text.push_str(&marshal_map(&body, 0)?);
    }

    let trimmed = app_meta.trim_name(obj.name());
    Ok(Fragment::new(
        file_name(&trimmed, "serviceaccount"),
        text,
        Values::new(),
    ))
}

fn binding_fragment(
    info: &ChartInfo,
    app_meta: &AppMetadata,
    obj: &Object,
    mut role_ref: RoleRef,
    subjects: Option<Vec<Subject>>,
) -> Result<Fragment> {
    role_ref.name = app_meta.templated_name(&role_ref.name);
    let subjects: Option<Vec<Subject>> = subjects.map(|subjects| {
        subjects
            .into_iter()
            .map(|mut subject| {
                subject.name = app_meta.templated_name(&subject.name);
                subject.namespace = Some(RELEASE_NAMESPACE.to_string());
                subject
            })
            .collect()
    });

    let mut body = JsonMap::new();
    body.insert("roleRef".to_string(), to_json("roleRef", &role_ref)?);
    if let Some(subjects) = subjects.as_ref() {
        body.insert("subjects".to_string(), to_json("subjects", subjects)?);
    }

    let mut text = meta::render(info, app_meta, obj)?;
    text.push_str(&marshal_map(&body, 0)?);

    Ok(Fragment::new(
        rbac_file_name(app_meta, obj.name(), "-rolebinding"),
        text,
        Values::new(),
    ))
}

/// `<trimmed name without suffix>-rbac.yaml`
fn rbac_file_name(app_meta: &AppMetadata, name: &str, suffix: &str) -> String {
    let trimmed = app_meta.trim_name(name);
    let base = trimmed.strip_suffix(suffix).unwrap_or(&trimmed);
    format!("{}-rbac.yaml", base)
}

fn typed<K: DeserializeOwned>(obj: &Object) -> Result<K> {
    serde_json::from_value(JsonValue::Object(obj.data().clone()))
        .map_err(|e| ConvertError::field_shape(obj.kind(), e.to_string()))
}

fn to_json<T: serde::Serialize>(field: &str, value: &T) -> Result<JsonValue> {
    serde_json::to_value(value).map_err(|e| ConvertError::field_shape(field, e.to_string()))
}
