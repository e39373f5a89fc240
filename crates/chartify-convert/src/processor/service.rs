//! Service transformer
//!
//! Service type and ports become values under `<name>Service`, so a
//! Service and the workload it fronts never share a values key.

use chartify_core::{AppMetadata, ChartInfo, Values};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::object::Object;
use crate::processor::{Fragment, file_name, meta};
use crate::unstructured::{get_object, take_array, take_object};
use crate::yaml::marshal_map;

const DEFAULT_TYPE: &str = "ClusterIP";

/// Values key of a service; `web` becomes `webService`
pub fn values_key(app_meta: &AppMetadata, name: &str) -> String {
    let key = app_meta.values_key(name);
    if key.to_ascii_lowercase().ends_with("service") {
        key
    } else {
        format!("{}Service", key)
    }
}

pub fn transform(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let key = values_key(app_meta, obj.name());
    let mut text = meta::render(info, app_meta, obj)?;
    let mut spec = get_object(obj.data(), "spec", "")?.cloned().unwrap_or_default();
    let mut values = Values::new();

    let service_type = match spec.shift_remove("type") {
        Some(JsonValue::String(t)) => t,
        _ => DEFAULT_TYPE.to_string(),
    };
    values.set_at_path(service_type, &[key.as_str(), "type"])?;

    // Allocated by the cluster, never part of a chart
    spec.shift_remove("clusterIP");
    spec.shift_remove("clusterIPs");

    let selector = take_object(&mut spec, "selector", "spec")?;
    let ports = take_array(&mut spec, "ports", "spec")?.filter(|p| !p.is_empty());
    if let Some(ports) = ports.as_ref() {
        values.set_at_path(JsonValue::Array(ports.clone()), &[key.as_str(), "ports"])?;
    }

    text.push_str("spec:\n");
    text.push_str(&format!("  type: {{{{ .Values.{}.type }}}}\n", key));
    if let Some(selector) = selector.as_ref() {
        text.push_str("  selector:\n");
        if !selector.is_empty() {
            text.push_str(&marshal_map(selector, 4)?);
        }
        text.push_str(&format!("  {}\n", info.selector_labels_include(4)));
    }
    if ports.is_some() {
        text.push_str("  ports:\n");
        text.push_str(&format!("  {{{{- toYaml .Values.{}.ports | nindent 2 }}}}\n", key));
    }
    if !spec.is_empty() {
        text.push_str(&marshal_map(&spec, 2)?);
    }

    let trimmed = app_meta.trim_name(obj.name());
    Ok(Fragment::new(file_name(&trimmed, "service"), text, values))
}
