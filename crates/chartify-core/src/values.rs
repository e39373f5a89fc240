//! Values tree with typed path insertion and conflict-checked merge
//!
//! Every transformer records the concrete values it extracts under a path of
//! the form `<object>.<container>.<field>.<sub-field>`. Paths are created on
//! demand; writing through an existing scalar is a structural conflict.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};

/// A single node of the values tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// Structural shape used for conflict detection
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Mapping(_) => "mapping",
            Value::Sequence(_) => "sequence",
            _ => "scalar",
        }
    }

    /// Two values are compatible when one may replace the other in place.
    pub fn is_compatible(&self, other: &Value) -> bool {
        self.shape() == other.shape()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn empty_mapping() -> Self {
        Value::Mapping(IndexMap::new())
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Sequence(value)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Value::Mapping(value)
    }
}

/// Root of a values tree
///
/// Keys keep insertion order, so the rendered `values.yaml` groups entries
/// by owning object in the order objects were transformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Values(IndexMap<String, Value>);

impl Values {
    /// Create an empty tree
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Set `value` at `path`, creating intermediate mappings as needed
    ///
    /// Rules:
    /// - Descending through an existing scalar or sequence is a conflict
    /// - Replacing a leaf keeps its position (last write wins)
    /// - Replacing a leaf with a value of another shape is a conflict
    pub fn set_at_path(&mut self, value: impl Into<Value>, path: &[&str]) -> Result<()> {
        let value = value.into();
        let (last, parents) = path.split_last().ok_or(CoreError::EmptyPath)?;

        let mut current = &mut self.0;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(Value::empty_mapping);
            current = match entry {
                Value::Mapping(map) => map,
                other => {
                    return Err(CoreError::ValuesConflict {
                        path: path[..=depth].join("."),
                        existing: other.shape(),
                        incoming: "mapping",
                    });
                }
            };
        }

        match current.entry((*last).to_string()) {
            Entry::Occupied(mut slot) => {
                if !slot.get().is_compatible(&value) {
                    return Err(CoreError::ValuesConflict {
                        path: path.join("."),
                        existing: slot.get().shape(),
                        incoming: value.shape(),
                    });
                }
                slot.insert(value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
        Ok(())
    }

    /// Get a value by path segments
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for segment in rest {
            current = current.as_mapping()?.get(*segment)?;
        }
        Some(current)
    }

    /// Deep merge another tree into this one
    ///
    /// Mappings merge recursively; any other collision is last write wins
    /// as long as both sides have the same shape.
    pub fn merge(&mut self, overlay: Values) -> Result<()> {
        let mut path = Vec::new();
        merge_maps(&mut self.0, overlay.0, &mut path)
    }

    /// Check if the tree has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Top-level keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn inner(&self) -> &IndexMap<String, Value> {
        &self.0
    }

    /// Render as a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        if self.0.is_empty() {
            return Ok("{}\n".to_string());
        }
        Ok(serde_yaml::to_string(&self.0)?)
    }
}

fn merge_maps(
    base: &mut IndexMap<String, Value>,
    overlay: IndexMap<String, Value>,
    path: &mut Vec<String>,
) -> Result<()> {
    for (key, incoming) in overlay {
        path.push(key.clone());
        match base.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
                (Value::Mapping(existing), Value::Mapping(incoming)) => {
                    merge_maps(existing, incoming, path)?;
                }
                (existing, incoming) => {
                    if !existing.is_compatible(&incoming) {
                        return Err(CoreError::ValuesConflict {
                            path: path.join("."),
                            existing: existing.shape(),
                            incoming: incoming.shape(),
                        });
                    }
                    *existing = incoming;
                }
            },
        }
        path.pop();
    }
    Ok(())
}
