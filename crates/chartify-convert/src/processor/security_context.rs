//! Security context sub-transformer
//!
//! Pod and container security contexts become opaque values blocks:
//! `<object>.podSecurityContext` and
//! `<object>.<container>.containerSecurityContext`.

use chartify_core::{Values, to_lower_camel};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::processor::pod::CONTAINER_FIELDS;
use crate::unstructured::{JsonMap, get_object, get_str, objects_mut};

/// Move non-empty security contexts of a pod spec into `values`
pub fn process(
    object_key: &str,
    spec: &mut JsonMap,
    values: &mut Values,
    indent: usize,
) -> Result<()> {
    let pod_context = get_object(spec, "securityContext", "spec")?
        .filter(|ctx| !ctx.is_empty())
        .cloned();
    if let Some(ctx) = pod_context {
        values.set_at_path(JsonValue::Object(ctx), &[object_key, "podSecurityContext"])?;
        spec.insert(
            "securityContext".to_string(),
            JsonValue::String(format!(
                "{{{{- toYaml .Values.{}.podSecurityContext | nindent {} }}}}",
                object_key,
                indent + 2
            )),
        );
    }

    for field in CONTAINER_FIELDS {
        for container in objects_mut(spec, field, "spec")? {
            let Some(name) = get_str(container, "name", field)? else {
                continue;
            };
            let key = to_lower_camel(name);

            let ctx = get_object(container, "securityContext", field)?
                .filter(|ctx| !ctx.is_empty())
                .cloned();
            if let Some(ctx) = ctx {
                values.set_at_path(
                    JsonValue::Object(ctx),
                    &[object_key, &key, "containerSecurityContext"],
                )?;
                container.insert(
                    "securityContext".to_string(),
                    JsonValue::String(format!(
                        "{{{{- toYaml .Values.{}.{}.containerSecurityContext | nindent {} }}}}",
                        object_key,
                        key,
                        indent + 4
                    )),
                );
            }
        }
    }

    Ok(())
}
