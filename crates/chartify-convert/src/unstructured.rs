//! Shape-checked access to untyped object trees
//!
//! Absent fields are `Ok(None)`; present fields of the wrong shape are
//! `FieldShape` errors naming the dotted field path.

use chartify_core::AppMetadata;
use serde_json::{Map, Value as JsonValue};

use crate::error::{ConvertError, Result};
use crate::object::type_name;

pub type JsonMap = Map<String, JsonValue>;

fn shape_error(path: &str, expected: &str, found: &JsonValue) -> ConvertError {
    ConvertError::field_shape(
        path,
        format!("expected a {}, found {}", expected, type_name(found)),
    )
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Borrow a mapping field
pub fn get_object<'a>(map: &'a JsonMap, key: &str, path: &str) -> Result<Option<&'a JsonMap>> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(inner)) => Ok(Some(inner)),
        Some(other) => Err(shape_error(&join(path, key), "mapping", other)),
    }
}

/// Borrow a mapping field mutably
pub fn get_object_mut<'a>(
    map: &'a mut JsonMap,
    key: &str,
    path: &str,
) -> Result<Option<&'a mut JsonMap>> {
    match map.get_mut(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(inner)) => Ok(Some(inner)),
        Some(other) => Err(shape_error(&join(path, key), "mapping", other)),
    }
}

/// Borrow a string field
pub fn get_str<'a>(map: &'a JsonMap, key: &str, path: &str) -> Result<Option<&'a str>> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(shape_error(&join(path, key), "string", other)),
    }
}

/// Remove and return a mapping field
pub fn take_object(map: &mut JsonMap, key: &str, path: &str) -> Result<Option<JsonMap>> {
    match map.shift_remove(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(inner)) => Ok(Some(inner)),
        Some(other) => Err(shape_error(&join(path, key), "mapping", &other)),
    }
}

/// Remove and return a sequence field
pub fn take_array(map: &mut JsonMap, key: &str, path: &str) -> Result<Option<Vec<JsonValue>>> {
    match map.shift_remove(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Array(items)) => Ok(Some(items)),
        Some(other) => Err(shape_error(&join(path, key), "sequence", &other)),
    }
}

/// Mutable view of every mapping in a sequence field
pub fn objects_mut<'a>(
    map: &'a mut JsonMap,
    key: &str,
    path: &str,
) -> Result<Vec<&'a mut JsonMap>> {
    let field = join(path, key);
    match map.get_mut(key) {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .iter_mut()
            .enumerate()
            .map(|(i, item)| match item {
                JsonValue::Object(inner) => Ok(inner),
                other => Err(shape_error(&format!("{}[{}]", field, i), "mapping", other)),
            })
            .collect(),
        Some(other) => Err(shape_error(&field, "sequence", other)),
    }
}

/// Pass a name field through the naming service, in place
pub fn template_name(
    map: &mut JsonMap,
    key: &str,
    path: &str,
    app_meta: &AppMetadata,
) -> Result<()> {
    if let Some(name) = get_str(map, key, path)? {
        let templated = app_meta.templated_name(name);
        map.insert(key.to_string(), JsonValue::String(templated));
    }
    Ok(())
}

/// Pass the name field of a nested reference (`<key>.<field>`) through the naming service
pub fn template_ref(
    map: &mut JsonMap,
    key: &str,
    field: &str,
    path: &str,
    app_meta: &AppMetadata,
) -> Result<()> {
    let nested_path = join(path, key);
    if let Some(reference) = get_object_mut(map, key, path)? {
        template_name(reference, field, &nested_path, app_meta)?;
    }
    Ok(())
}

/// Point a service reference at the templated service in the release namespace
pub fn template_service_ref(
    service: &mut JsonMap,
    path: &str,
    app_meta: &AppMetadata,
) -> Result<()> {
    template_name(service, "name", path, app_meta)?;
    if service.contains_key("namespace") {
        service.insert(
            "namespace".to_string(),
            JsonValue::String(chartify_core::RELEASE_NAMESPACE.to_string()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartify_core::Config;
    use serde_json::json;

    fn app_meta() -> AppMetadata {
        AppMetadata::new(Config {
            app_name: Some("my-app".to_string()),
            ..Default::default()
        })
    }

    fn map(value: JsonValue) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_shape_errors_name_the_field() {
        let spec = map(json!({"containers": "nginx"}));
        let mut copy = spec.clone();
        let err = objects_mut(&mut copy, "containers", "spec").unwrap_err();
        match err {
            ConvertError::FieldShape { field, message } => {
                assert_eq!(field, "spec.containers");
                assert!(message.contains("sequence"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(get_object(&spec, "containers", "spec").is_err());
        assert!(get_object(&spec, "missing", "spec").unwrap().is_none());
    }

    #[test]
    fn test_objects_mut_reports_index() {
        let mut spec = map(json!({"volumes": [{"name": "a"}, 3]}));
        let err = objects_mut(&mut spec, "volumes", "spec").unwrap_err();
        assert!(err.to_string().contains("spec.volumes[1]"));
    }

    #[test]
    fn test_template_ref() {
        let meta = app_meta();
        let mut volume = map(json!({"name": "config", "configMap": {"name": "my-app-config"}}));
        template_ref(&mut volume, "configMap", "name", "volume", &meta).unwrap();
        assert_eq!(
            volume["configMap"]["name"],
            json!("{{ include \"chart.fullname\" . }}-config")
        );
    }

    #[test]
    fn test_take_preserves_remaining_order() {
        let mut spec = map(json!({"a": 1, "b": {"x": 1}, "c": 3}));
        let taken = take_object(&mut spec, "b", "").unwrap();
        assert!(taken.is_some());
        assert_eq!(spec.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_service_ref_namespace() {
        let meta = app_meta();
        let mut service = map(json!({"name": "my-app-webhook-service", "namespace": "system", "path": "/mutate"}));
        template_service_ref(&mut service, "clientConfig.service", &meta).unwrap();
        assert_eq!(service["namespace"], json!("{{ .Release.Namespace }}"));
        assert_eq!(
            service["name"],
            json!("{{ include \"chart.fullname\" . }}-webhook-service")
        );
        assert_eq!(service["path"], json!("/mutate"));
    }
}
