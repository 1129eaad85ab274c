//! Link normalization
//!
//! The API represents references to other resources as hypermedia links,
//! e.g. `"tagsLink": [{"title": "Weather", "rel": "tag", "href": "/tags/weather"}]`.
//! The CLI works with plain names, so every `*Link*` field collapses to the
//! titles it points at and loses the `Link` part of its name.

use serde_json::Value;

use super::ApiError;
use crate::record::Record;

const LINK_MARKER: &str = "Link";

/// Collapse link fields of an API object into plain titles
pub fn normalize(value: Value) -> Result<Record, ApiError> {
    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| {
                if key.contains(LINK_MARKER) {
                    (key.replace(LINK_MARKER, ""), link_titles(value))
                } else {
                    (key, value)
                }
            })
            .collect()),
        other => Err(ApiError::InvalidResponse(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

fn link_titles(value: Value) -> Value {
    match value {
        Value::Array(links) => Value::Array(links.into_iter().filter_map(title).collect()),
        Value::Object(_) => title(value).unwrap_or(Value::Null),
        other => other,
    }
}

fn title(link: Value) -> Option<Value> {
    match link {
        Value::Object(mut map) => map.remove("title"),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
