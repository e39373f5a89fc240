//! CustomResourceDefinition transformer
//!
//! A CRD's name is `<plural>.<group>` and must stay as is. Only the
//! conversion webhook service and the CA injection annotation refer to
//! objects of the chart.

use chartify_core::{AppMetadata, ChartInfo, Values};

use crate::error::Result;
use crate::object::Object;
use crate::processor::webhook::inject_ca_annotation;
use crate::processor::{Fragment, meta};
use crate::unstructured::{JsonMap, get_object, get_object_mut, get_str, template_service_ref};
use crate::yaml::marshal_map;

const SERVICE_PATH: &str = "spec.conversion.webhook.clientConfig.service";

pub fn transform(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let annotations = meta::annotations(obj)?.map(|a| inject_ca_annotation(app_meta, a));
    let mut text = meta::render_with(info, obj, obj.name(), annotations.as_ref())?;

    let mut body = obj.body();
    if let Some(service) = conversion_service(&mut body)? {
        template_service_ref(service, SERVICE_PATH, app_meta)?;
    }
    if !body.is_empty() {
        text.push_str(&marshal_map(&body, 0)?);
    }

    Ok(Fragment::new(output_name(app_meta, obj)?, text, Values::new()))
}

fn conversion_service(body: &mut JsonMap) -> Result<Option<&mut JsonMap>> {
    let mut current = body;
    let mut path = String::new();
    for key in ["spec", "conversion", "webhook", "clientConfig", "service"] {
        let next = match get_object_mut(current, key, &path)? {
            Some(next) => next,
            None => return Ok(None),
        };
        path = if path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", path, key)
        };
        current = next;
    }
    Ok(Some(current))
}

/// `<kind>-crd.yaml`, from `spec.names.kind`
fn output_name(app_meta: &AppMetadata, obj: &Object) -> Result<String> {
    let kind = match get_object(obj.data(), "spec", "")? {
        Some(spec) => match get_object(spec, "names", "spec")? {
            Some(names) => get_str(names, "kind", "spec.names")?,
            None => None,
        },
        None => None,
    };
    let base = match kind {
        Some(kind) => kind.to_ascii_lowercase(),
        None => app_meta.trim_name(obj.name()),
    };
    Ok(format!("{}-crd.yaml", base))
}
