//! YAML output for templated manifests
//!
//! Trees are serialized with `serde_yaml`. Template actions are plain
//! string scalars in the tree; `serde_yaml` quotes them because they start
//! with a flow indicator, so the quotes around exactly those scalars are
//! removed afterwards. That lets block actions such as
//! `{{- toYaml .Values.x | nindent 10 }}` sit directly after a mapping key.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;

/// Render a mapping with every line indented by `indent` spaces
pub fn marshal_map(map: &Map<String, JsonValue>, indent: usize) -> Result<String> {
    let mut templates = Vec::new();
    for value in map.values() {
        collect_templates(value, &mut templates);
    }
    render(map, &templates, indent)
}

/// Render any value with every line indented by `indent` spaces
pub fn marshal(value: &JsonValue, indent: usize) -> Result<String> {
    let mut templates = Vec::new();
    collect_templates(value, &mut templates);
    render(value, &templates, indent)
}

/// Render a single `key: value` entry at `indent`
pub fn marshal_field(key: &str, value: &JsonValue, indent: usize) -> Result<String> {
    let mut map = Map::new();
    map.insert(key.to_string(), value.clone());
    marshal_map(&map, indent)
}

/// Whether a string carries a template action
pub fn is_template(s: &str) -> bool {
    s.contains("{{")
}

fn render<T: Serialize + ?Sized>(value: &T, templates: &[&str], indent: usize) -> Result<String> {
    let mut text = serde_yaml::to_string(value)?;
    for template in templates {
        let quoted = format!("'{}'", template.replace('\'', "''"));
        if text.contains(&quoted) {
            text = text.replace(&quoted, template);
        }
    }
    Ok(indent_lines(&text, indent))
}

fn collect_templates<'a>(value: &'a JsonValue, out: &mut Vec<&'a str>) {
    match value {
        JsonValue::String(s) if is_template(s) && !out.contains(&s.as_str()) => out.push(s),
        JsonValue::Array(items) => items.iter().for_each(|item| collect_templates(item, out)),
        JsonValue::Object(map) => map.values().for_each(|item| collect_templates(item, out)),
        _ => {}
    }
}

fn indent_lines(text: &str, indent: usize) -> String {
    if indent == 0 {
        return text.to_string();
    }
    let pad = " ".repeat(indent);
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line != "\n" {
            out.push_str(&pad);
        }
        out.push_str(line);
    }
    out
}
