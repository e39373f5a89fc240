//! Decoded Kubernetes objects and their kinds

use k8s_openapi::Resource;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::error::{ConvertError, Result};

/// Group, version and kind of a decoded object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    /// Split an `apiVersion` such as `apps/v1` (or core `v1`) into its parts
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Static kind claimed by a transformer
///
/// Built from `k8s-openapi` resource constants where the type exists, so
/// group and version strings are never typed by hand for built-in kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
}

impl ResourceKind {
    pub const fn new(group: &'static str, version: &'static str, kind: &'static str) -> Self {
        Self {
            group,
            version,
            kind,
        }
    }

    /// Kind of a built-in `k8s-openapi` resource type
    pub const fn of<K: Resource>() -> Self {
        Self::new(K::GROUP, K::VERSION, K::KIND)
    }

    /// Exact group, version and kind equality
    pub fn matches(&self, gvk: &GroupVersionKind) -> bool {
        self.group == gvk.group && self.version == gvk.version && self.kind == gvk.kind
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// One decoded resource, immutable once received
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    data: Map<String, JsonValue>,
    gvk: GroupVersionKind,
    document: usize,
}

impl Object {
    /// Wrap a decoded document; `apiVersion` and `kind` are required
    pub fn from_value(value: JsonValue, document: usize) -> Result<Self> {
        let data = match value {
            JsonValue::Object(data) => data,
            other => {
                return Err(ConvertError::Decode {
                    document,
                    message: format!("expected a mapping, found {}", type_name(&other)),
                });
            }
        };

        let api_version = required_str(&data, "apiVersion", document)?;
        let kind = required_str(&data, "kind", document)?;
        let gvk = GroupVersionKind::from_api_version(api_version, kind);

        Ok(Self {
            data,
            gvk,
            document,
        })
    }

    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    pub fn kind(&self) -> &str {
        &self.gvk.kind
    }

    pub fn api_version(&self) -> &str {
        self.data
            .get("apiVersion")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
    }

    /// `metadata.name`, empty when absent
    pub fn name(&self) -> &str {
        self.metadata_str("name").unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str("namespace")
    }

    pub fn metadata(&self) -> Option<&Map<String, JsonValue>> {
        self.data.get("metadata").and_then(JsonValue::as_object)
    }

    /// Index of the YAML document the object came from
    pub fn document(&self) -> usize {
        self.document
    }

    pub fn data(&self) -> &Map<String, JsonValue> {
        &self.data
    }

    /// Top-level field
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }

    /// Top-level fields that carry the object's body
    ///
    /// Type information, metadata and status are handled separately by
    /// every transformer.
    pub fn body(&self) -> Map<String, JsonValue> {
        self.data
            .iter()
            .filter(|(key, _)| {
                !matches!(key.as_str(), "apiVersion" | "kind" | "metadata" | "status")
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata()?.get(key)?.as_str()
    }
}

fn required_str<'a>(
    data: &'a Map<String, JsonValue>,
    key: &str,
    document: usize,
) -> Result<&'a str> {
    match data.get(key).and_then(JsonValue::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConvertError::Decode {
            document,
            message: format!("missing or empty '{}'", key),
        }),
    }
}

pub(crate) fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::Deployment;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let obj = Object::from_value(
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {"name": "my-app-web", "namespace": "prod"},
                "spec": {"replicas": 1},
                "status": {}
            }),
            0,
        )
        .unwrap();

        assert_eq!(obj.name(), "my-app-web");
        assert_eq!(obj.namespace(), Some("prod"));
        assert_eq!(obj.api_version(), "apps/v1");
        assert!(ResourceKind::of::<Deployment>().matches(obj.gvk()));
        assert_eq!(obj.body().keys().collect::<Vec<_>>(), vec!["spec"]);
    }

    #[test]
    fn test_core_group() {
        let gvk = GroupVersionKind::from_api_version("v1", "Service");
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.to_string(), "v1/Service");
    }

    #[test]
    fn test_missing_kind_is_decode_error() {
        let err = Object::from_value(json!({"apiVersion": "v1"}), 3).unwrap_err();
        match err {
            ConvertError::Decode { document, message } => {
                assert_eq!(document, 3);
                assert!(message.contains("kind"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scalar_document_is_decode_error() {
        assert!(Object::from_value(json!("text"), 0).is_err());
    }

    #[test]
    fn test_version_mismatch_does_not_match() {
        let gvk = GroupVersionKind::from_api_version("apps/v1beta1", "Deployment");
        assert!(!ResourceKind::of::<Deployment>().matches(&gvk));
    }
}
