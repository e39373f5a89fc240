//! ConfigMap transformer
//!
//! Single-line settings in `data` become quoted values lookups. Entries
//! that look like files (dotted keys such as `app.properties`, or
//! multi-line content) are kept verbatim in the template.

use chartify_core::{AppMetadata, ChartInfo, Values, to_lower_camel};
use serde_json::Value as JsonValue;

use crate::error::{ConvertError, Result};
use crate::object::{Object, type_name};
use crate::processor::{Fragment, file_name, meta};
use crate::unstructured::{JsonMap, get_object};
use crate::yaml::marshal_map;

pub fn transform(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let key = app_meta.values_key(obj.name());
    let mut text = meta::render(info, app_meta, obj)?;
    let mut body = obj.body();
    let mut values = Values::new();

    if let Some(data) = get_object(obj.data(), "data", "")? {
        let mut templated = JsonMap::new();
        for (entry, content) in data {
            let content = match content {
                JsonValue::String(s) => s,
                other => {
                    return Err(ConvertError::field_shape(
                        format!("data.{}", entry),
                        format!("expected a string, found {}", type_name(other)),
                    ));
                }
            };

            if is_file(entry, content) {
                templated.insert(entry.clone(), JsonValue::String(content.clone()));
                continue;
            }
            let value_key = entry_key(entry);
            values.set_at_path(content.as_str(), &[key.as_str(), value_key.as_str()])?;
            templated.insert(
                entry.clone(),
                JsonValue::String(format!("{{{{ quote .Values.{}.{} }}}}", key, value_key)),
            );
        }
        body.insert("data".to_string(), JsonValue::Object(templated));
    }

    if !body.is_empty() {
        text.push_str(&marshal_map(&body, 0)?);
    }

    let trimmed = app_meta.trim_name(obj.name());
    Ok(Fragment::new(file_name(&trimmed, "configmap"), text, values))
}

fn is_file(entry: &str, content: &str) -> bool {
    entry.contains('.') || content.contains('\n')
}

/// Values key for a data entry; `LOG_LEVEL` becomes `logLevel`
pub(crate) fn entry_key(entry: &str) -> String {
    if entry.chars().any(char::is_lowercase) {
        to_lower_camel(entry)
    } else {
        to_lower_camel(&entry.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartify_core::{Config, Value};
    use serde_json::json;

    fn app_meta() -> AppMetadata {
        AppMetadata::new(Config {
            app_name: Some("my-app".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_settings_become_values() {
        let meta = app_meta();
        let obj = Object::from_value(
            json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {"name": "my-app-settings"},
                "data": {
                    "LOG_LEVEL": "info",
                    "feature-flag": "true",
                    "app.properties": "a=1\nb=2\n"
                }
            }),
            0,
        )
        .unwrap();

        let fragment = transform(&meta.chart_info(), &meta, &obj).unwrap();
        assert_eq!(fragment.output_name, "settings-configmap.yaml");
        assert!(fragment
            .text
            .contains("  LOG_LEVEL: {{ quote .Values.settings.logLevel }}\n"));
        assert!(fragment
            .text
            .contains("  feature-flag: {{ quote .Values.settings.featureFlag }}\n"));
        assert!(fragment.text.contains("  app.properties: |\n    a=1\n    b=2\n"));

        assert_eq!(
            fragment.values.get(&["settings", "featureFlag"]),
            Some(&Value::from("true"))
        );
        assert!(fragment.values.get(&["settings", "appProperties"]).is_none());
    }

    #[test]
    fn test_entry_key() {
        assert_eq!(entry_key("LOG_LEVEL"), "logLevel");
        assert_eq!(entry_key("tls.crt"), "tlsCrt");
        assert_eq!(entry_key("maxConnections"), "maxConnections");
    }

    #[test]
    fn test_binary_data_kept() {
        let meta = app_meta();
        let obj = Object::from_value(
            json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {"name": "my-app-blob"},
                "binaryData": {"logo.png": "iVBORw0KGgo="},
                "immutable": true
            }),
            0,
        )
        .unwrap();

        let fragment = transform(&meta.chart_info(), &meta, &obj).unwrap();
        assert!(fragment.text.ends_with("binaryData:\n  logo.png: iVBORw0KGgo=\nimmutable: true\n"));
        assert!(fragment.values.is_empty());
    }
}
