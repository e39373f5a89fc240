//! Common object metadata
//!
//! Every templated object gets a templated name, drops its namespace (the
//! release namespace applies) and appends the chart labels to its own.

use chartify_core::{AppMetadata, ChartInfo};

use crate::error::Result;
use crate::object::Object;
use crate::unstructured::{JsonMap, get_object};
use crate::yaml::{marshal_field, marshal_map};
use serde_json::Value as JsonValue;

/// Header of a templated object, name passed through the naming service
pub fn render(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<String> {
    let name = app_meta.templated_name(obj.name());
    let annotations = annotations(obj)?;
    render_with(info, obj, &name, annotations.as_ref())
}

/// Header of a templated object with an explicit name and annotations
pub fn render_with(
    info: &ChartInfo,
    obj: &Object,
    name: &str,
    annotations: Option<&JsonMap>,
) -> Result<String> {
    let labels = match obj.metadata() {
        Some(metadata) => get_object(metadata, "labels", "metadata")?,
        None => None,
    };

    let mut out = String::new();
    out.push_str(&marshal_field("apiVersion", &JsonValue::from(obj.api_version()), 0)?);
    out.push_str(&marshal_field("kind", &JsonValue::from(obj.kind()), 0)?);
    out.push_str("metadata:\n");
    out.push_str(&marshal_field("name", &JsonValue::from(name), 2)?);
    out.push_str("  labels:\n");
    if let Some(labels) = labels.filter(|l| !l.is_empty()) {
        out.push_str(&marshal_map(labels, 4)?);
    }
    out.push_str(&format!("  {}\n", info.labels_include(4)));
    if let Some(annotations) = annotations.filter(|a| !a.is_empty()) {
        out.push_str("  annotations:\n");
        out.push_str(&marshal_map(annotations, 4)?);
    }
    Ok(out)
}

/// Copy of `metadata.annotations`
pub fn annotations(obj: &Object) -> Result<Option<JsonMap>> {
    match obj.metadata() {
        Some(metadata) => Ok(get_object(metadata, "annotations", "metadata")?.cloned()),
        None => Ok(None),
    }
}
