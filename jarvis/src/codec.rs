//! Text form of a record
//!
//! The editable text form is a metadata block of `Key: value` lines, one per
//! visible field in schema order, then a blank line, then the body:
//!
//! ```text
//! Name: Weather
//! Author: Jane Doe
//! Tags: Outdoors, Seasons
//!
//! # Weather
//! ```
//!
//! Events have no body; their text form still ends with the blank line so the
//! same text decodes back to the same fields. Anything typed after that blank
//! line in an event buffer is rejected rather than dropped.
//!
//! Metadata values are single lines. A newline inside a value is written as
//! `\n` and a backslash as `\\`, so a literal backslash typed into the
//! editor must be doubled (`Todo: see C:\\notes`).

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::record::{BODY_FIELD, FieldType, Record, ResourceKind, SERVER_OWNED_FIELDS, TAGS_FIELD};

/// Separator between metadata block and body
const SEPARATOR: &str = "\n\n";

/// Separator between list elements in a metadata value
const LIST_SEPARATOR: &str = ", ";

/// Errors raised while decoding a text record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed {kind} record: no blank line between metadata and body")]
    MissingSeparator { kind: ResourceKind },

    #[error("Malformed metadata on line {line}: {text:?} (expected `Key: value`)")]
    MalformedLine { line: usize, text: String },

    #[error("Field {field} on line {line} must be a whole number, got {value:?}")]
    InvalidInteger { field: String, line: usize, value: String },

    #[error("Malformed {kind} record: text after the blank line belongs in a metadata field")]
    UnexpectedBody { kind: ResourceKind },
}

/// Decode a text buffer into a record of the given kind
pub fn decode(kind: ResourceKind, text: &str) -> Result<Record, CodecError> {
    debug!(%kind, len = text.len(), "decode: called");
    let (metadata, body) = match text.split_once(SEPARATOR) {
        Some((metadata, body)) => (metadata, Some(body)),
        None if kind.has_body() => return Err(CodecError::MissingSeparator { kind }),
        None => (text, None),
    };

    let mut record = Record::new();

    for (index, line) in metadata.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let (key, raw) = split_metadata_line(line).ok_or_else(|| CodecError::MalformedLine {
            line: line_no,
            text: line.to_string(),
        })?;

        let spec = kind.field(key);
        let name = spec.map(|s| s.name.to_string()).unwrap_or_else(|| key.to_lowercase());
        let ty = spec.map(|s| s.ty).unwrap_or(FieldType::Text);
        let value = unescape(raw.trim());

        let value = match ty {
            FieldType::List => Value::from(split_list(&value)),
            FieldType::Integer if value.is_empty() => Value::Null,
            FieldType::Integer => {
                let number = value.parse::<i64>().map_err(|_| CodecError::InvalidInteger {
                    field: name.clone(),
                    line: line_no,
                    value: value.clone(),
                })?;
                Value::from(number)
            }
            FieldType::Text if value.is_empty() => Value::Null,
            FieldType::Text => Value::String(value),
        };
        record.insert(name, value);
    }

    // Older records omitted the tags line entirely
    if kind.has_tags() && !record.contains(TAGS_FIELD) {
        record.insert(TAGS_FIELD, Value::Array(Vec::new()));
    }

    match body {
        Some(body) if kind.has_body() => {
            record.insert(BODY_FIELD, body);
        }
        Some(body) if !body.trim().is_empty() => return Err(CodecError::UnexpectedBody { kind }),
        _ => {}
    }

    debug!(fields = record.len(), "decode: done");
    Ok(record)
}

/// Encode the visible `fields` of a record into its text form
pub fn encode(kind: ResourceKind, fields: &[&str], record: &Record) -> String {
    debug!(%kind, fields = fields.len(), "encode: called");
    let metadata = fields
        .iter()
        .map(|field| format!("{}: {}", capitalize(field), render_value(record.get(field))))
        .collect::<Vec<_>>()
        .join("\n");

    let mut text = metadata;
    text.push_str(SEPARATOR);
    if kind.has_body()
        && let Some(body) = record.body()
    {
        text.push_str(body);
    }
    text
}

/// Project a record onto a create/update request by dropping server-owned fields
pub fn to_request(record: &Record) -> Record {
    record
        .iter()
        .filter(|(key, _)| !SERVER_OWNED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Split `Key: value` into key and raw value; `Key:` alone is an empty value
fn split_metadata_line(line: &str) -> Option<(&str, &str)> {
    let (key, rest) = line.split_once(':')?;
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    if rest.is_empty() {
        return Some((key, ""));
    }
    rest.strip_prefix(' ').map(|value| (key, value))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => escape(s),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => escape(s),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Some(other) => other.to_string(),
    }
}

/// Upper-case the first letter, leave the rest untouched
fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
