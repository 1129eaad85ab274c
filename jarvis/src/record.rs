//! Resource records and their per-kind field schemas
//!
//! A [`Record`] is an ordered JSON object as exchanged with the Jarvis API.
//! [`ResourceKind`] carries everything that differs between tags, log entries
//! and events: the collection endpoint, the identifying field and the ordered
//! field schema that drives the text form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Fields owned by the server; stripped before a record is sent as a request
pub const SERVER_OWNED_FIELDS: &[&str] = &["created", "id", "version", "modified"];

/// Field holding free-form prose for tags and log entries
pub const BODY_FIELD: &str = "body";

/// Field holding related tag names
pub const TAGS_FIELD: &str = "tags";

/// An ordered mapping from field name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.shift_remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// String value of a field, `None` when missing, null or not a string
    pub fn str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Display text of a scalar field; numbers are rendered, null is `None`
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Related tag names; a missing or null `tags` field is the empty list
    pub fn tags(&self) -> Vec<String> {
        match self.0.get(TAGS_FIELD) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn body(&self) -> Option<&str> {
        self.str(BODY_FIELD)
    }

    /// Copy of this record holding only the named fields, in the given order
    pub fn restrict(&self, fields: &[&str]) -> Record {
        let mut restricted = Record::new();
        for field in fields {
            if let Some(value) = self.0.get(*field) {
                restricted.insert(*field, value.clone());
            }
        }
        restricted
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How a field is represented in the text form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free text, empty means null
    Text,
    /// Whole number, empty means null
    Integer,
    /// Comma-space separated list of names
    List,
}

/// One entry of a resource kind's ordered field schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    /// Read-only fields appear in the show view but never in the edit view
    pub show_only: bool,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Text,
            show_only: false,
        }
    }

    const fn integer(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Integer,
            show_only: false,
        }
    }

    const fn list(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::List,
            show_only: false,
        }
    }

    const fn read_only(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Text,
            show_only: true,
        }
    }
}

const TAG_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name"),
    FieldSpec::text("author"),
    FieldSpec::text("created"),
    FieldSpec::read_only("modified"),
    FieldSpec::text("version"),
    FieldSpec::list(TAGS_FIELD),
];

const LOG_ENTRY_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("id"),
    FieldSpec::text("author"),
    FieldSpec::text("created"),
    FieldSpec::text("occurred"),
    FieldSpec::text("version"),
    FieldSpec::list(TAGS_FIELD),
    FieldSpec::integer("parent"),
    FieldSpec::text("event"),
    FieldSpec::text("todo"),
];

const EVENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("eventId"),
    FieldSpec::text("created"),
    FieldSpec::text("occurred"),
    FieldSpec::text("category"),
    FieldSpec::text("source"),
    FieldSpec::integer("weight"),
    FieldSpec::text("description"),
];

/// The three resource collections served by the Jarvis API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Tag,
    LogEntry,
    Event,
}

impl ResourceKind {
    /// Collection endpoint name
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::LogEntry => "logentries",
            Self::Event => "events",
        }
    }

    /// Field that identifies a resource within its collection
    pub fn id_field(self) -> &'static str {
        match self {
            Self::Tag => "name",
            Self::LogEntry => "id",
            Self::Event => "eventId",
        }
    }

    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            Self::Tag => TAG_FIELDS,
            Self::LogEntry => LOG_ENTRY_FIELDS,
            Self::Event => EVENT_FIELDS,
        }
    }

    /// Tags and log entries carry a trailing body; events keep prose in `description`
    pub fn has_body(self) -> bool {
        matches!(self, Self::Tag | Self::LogEntry)
    }

    pub fn has_tags(self) -> bool {
        self.schema().iter().any(|spec| spec.ty == FieldType::List)
    }

    /// Fields rendered when displaying a resource
    pub fn show_fields(self) -> Vec<&'static str> {
        self.schema().iter().map(|spec| spec.name).collect()
    }

    /// Fields rendered into the editing buffer
    pub fn edit_fields(self) -> Vec<&'static str> {
        self.schema()
            .iter()
            .filter(|spec| !spec.show_only)
            .map(|spec| spec.name)
            .collect()
    }

    /// Look up a field by name, ignoring ASCII case
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.schema().iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
    }

    /// Identifier of a record of this kind, rendered as text
    pub fn id_of(self, record: &Record) -> Option<String> {
        record.text(self.id_field())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag => write!(f, "tag"),
            Self::LogEntry => write!(f, "log entry"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// Event categories, each with a default weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Consumed,
    Produced,
    Experienced,
    Interacted,
    Formulated,
    Completed,
    Detected,
    Measured,
}

impl EventCategory {
    pub const ALL: [EventCategory; 8] = [
        Self::Consumed,
        Self::Produced,
        Self::Experienced,
        Self::Interacted,
        Self::Formulated,
        Self::Completed,
        Self::Detected,
        Self::Measured,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consumed => "consumed",
            Self::Produced => "produced",
            Self::Experienced => "experienced",
            Self::Interacted => "interacted",
            Self::Formulated => "formulated",
            Self::Completed => "completed",
            Self::Detected => "detected",
            Self::Measured => "measured",
        }
    }

    pub fn default_weight(self) -> i64 {
        match self {
            Self::Consumed | Self::Produced | Self::Experienced => 100,
            Self::Interacted | Self::Formulated => 80,
            Self::Completed => 50,
            Self::Detected => 10,
            Self::Measured => 5,
        }
    }

    /// Comma separated list of every category name
    pub fn names() -> String {
        Self::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown event category: {}. Use one of: {}", s, Self::names()))
    }
}
