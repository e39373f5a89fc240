//! Deployment, StatefulSet and DaemonSet
//!
//! Replicas become a value, selector and pod labels gain the chart's
//! selector labels, and the pod template's spec goes through the pod spec
//! transformer at column 6.

use chartify_core::{AppMetadata, ChartInfo};
use serde_json::Value as JsonValue;

use crate::error::{ConvertError, Result};
use crate::object::Object;
use crate::processor::{Fragment, file_name, meta, pod};
use crate::unstructured::{JsonMap, get_object, take_object};
use crate::yaml::marshal_map;

/// Column the pod spec fields are rendered at
const POD_SPEC_INDENT: usize = 6;

pub fn transform(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let name = obj.name();
    let key = app_meta.values_key(name);
    let header = meta::render(info, app_meta, obj)?;

    let mut spec = get_object(obj.data(), "spec", "")?
        .cloned()
        .ok_or_else(|| ConvertError::field_shape("spec", "workload spec is required"))?;

    let mut values = chartify_core::Values::new();
    let replicas = spec.shift_remove("replicas");
    if let Some(replicas) = replicas.as_ref().filter(|r| !r.is_null()) {
        values.set_at_path(replicas.clone(), &[key.as_str(), "replicas"])?;
    }

    if let Some(JsonValue::String(service)) = spec.get("serviceName") {
        let templated = app_meta.templated_name(service);
        spec.insert("serviceName".to_string(), JsonValue::String(templated));
    }

    let mut selector = take_object(&mut spec, "selector", "spec")?.unwrap_or_default();
    let match_labels = take_object(&mut selector, "matchLabels", "spec.selector")?;

    let mut template = take_object(&mut spec, "template", "spec")?
        .ok_or_else(|| ConvertError::field_shape("spec.template", "pod template is required"))?;
    let template_meta = take_object(&mut template, "metadata", "spec.template")?.unwrap_or_default();
    let pod_labels = get_object(&template_meta, "labels", "spec.template.metadata")?;
    let pod_annotations = get_object(&template_meta, "annotations", "spec.template.metadata")?;
    let pod_spec = take_object(&mut template, "spec", "spec.template")?
        .ok_or_else(|| ConvertError::field_shape("spec.template.spec", "pod spec is required"))?;

    let pod = pod::process(&key, app_meta, pod_spec, POD_SPEC_INDENT)?;
    values.merge(pod.values)?;

    let mut text = header;
    text.push_str("spec:\n");
    if values.get(&[key.as_str(), "replicas"]).is_some() {
        text.push_str(&format!("  replicas: {{{{ .Values.{}.replicas }}}}\n", key));
    }
    text.push_str("  selector:\n    matchLabels:\n");
    if let Some(labels) = match_labels.as_ref().filter(|l| !l.is_empty()) {
        text.push_str(&marshal_map(labels, 6)?);
    }
    text.push_str(&format!("    {}\n", info.selector_labels_include(6)));
    if !selector.is_empty() {
        text.push_str(&marshal_map(&selector, 4)?);
    }
    if !spec.is_empty() {
        text.push_str(&marshal_map(&spec, 2)?);
    }
    text.push_str("  template:\n    metadata:\n      labels:\n");
    if let Some(labels) = pod_labels.filter(|l| !l.is_empty()) {
        text.push_str(&marshal_map(labels, 8)?);
    }
    text.push_str(&format!("      {}\n", info.selector_labels_include(8)));
    if let Some(annotations) = pod_annotations.filter(|a| !a.is_empty()) {
        text.push_str("      annotations:\n");
        text.push_str(&marshal_map(annotations, 8)?);
    }
    text.push_str("    spec:\n");
    text.push_str(&pod_spec_text(&pod.spec)?);

    let trimmed = app_meta.trim_name(name);
    Ok(Fragment::new(
        file_name(&trimmed, &obj.kind().to_ascii_lowercase()),
        text,
        values,
    ))
}

fn pod_spec_text(spec: &JsonMap) -> Result<String> {
    if spec.is_empty() {
        return Ok(String::new());
    }
    marshal_map(spec, POD_SPEC_INDENT)
}
