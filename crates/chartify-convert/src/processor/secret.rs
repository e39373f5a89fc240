//! Secret transformer
//!
//! Secret material never reaches `values.yaml`: every `data` and
//! `stringData` entry becomes an empty, required value the operator must
//! supply at install time.

use chartify_core::{AppMetadata, ChartInfo, Values};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::object::Object;
use crate::processor::configmap::entry_key;
use crate::processor::{Fragment, file_name, meta};
use crate::unstructured::{JsonMap, get_object};
use crate::yaml::marshal_map;

pub fn transform(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let key = app_meta.values_key(obj.name());
    let mut text = meta::render(info, app_meta, obj)?;
    let mut body = obj.body();
    let mut values = Values::new();

    for (field, encode) in [("data", true), ("stringData", false)] {
        let Some(entries) = get_object(obj.data(), field, "")? else {
            continue;
        };
        let mut templated = JsonMap::new();
        for entry in entries.keys() {
            let value_key = entry_key(entry);
            values.set_at_path("", &[key.as_str(), value_key.as_str()])?;

            let pipeline = if encode { " | b64enc | quote" } else { " | quote" };
            templated.insert(
                entry.clone(),
                JsonValue::String(format!(
                    "{{{{ required \"{0}.{1} is required\" .Values.{0}.{1}{2} }}}}",
                    key, value_key, pipeline
                )),
            );
        }
        body.insert(field.to_string(), JsonValue::Object(templated));
    }

    if !body.is_empty() {
        text.push_str(&marshal_map(&body, 0)?);
    }

    let trimmed = app_meta.trim_name(obj.name());
    Ok(Fragment::new(file_name(&trimmed, "secret"), text, values))
}
