//! Terminal formatting for listings
//!
//! Log entries are summarised as a few lines: identifiers, a date-delta line,
//! tags, a one-line blurb and, for searches, numbered match windows. Tags and
//! events are laid out as simple whitespace-aligned tables.

use chrono::{DateTime, NaiveDateTime};
use regex::RegexBuilder;
use serde_json::Value;
use thiserror::Error;

use crate::record::Record;

/// Maximum characters of the body's first line shown in a summary
pub const BLURB_LEN: usize = 250;

/// Characters of context kept on each side of a search match
pub const SEARCH_CONTEXT: usize = 30;

/// Width of string columns in tag and event tables
pub const COLUMN_WIDTH: usize = 40;

/// Width of an event description in the detail view
pub const EVENT_DETAIL_WIDTH: usize = 80;

const NANOS_PER_HOUR: i64 = 3_600_000_000_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

const SEARCH_SEPARATOR: &str = "\n\nSearch matches:\n";

/// Errors raised while formatting a single record
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Record has no {0} field")]
    MissingField(&'static str),

    #[error("Invalid timestamp in {field}: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Invalid search term: {0}")]
    Search(#[from] regex::Error),
}

/// Parse an ISO-8601 timestamp, with or without offset or fractional seconds
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, FormatError> {
    parse_timestamp(value).ok_or_else(|| FormatError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}

/// Whole hours from `occurred` to `created`, rounded toward negative infinity
pub fn delta_hours(occurred: &str, created: &str) -> Result<i64, FormatError> {
    let occurred = timestamp("occurred", occurred)?;
    let created = timestamp("created", created)?;
    let delta = created - occurred;
    // Nanoseconds overflow past about 292 years
    let hours = match delta.num_nanoseconds() {
        Some(nanos) => nanos.div_euclid(NANOS_PER_HOUR),
        None => delta.num_milliseconds().div_euclid(MILLIS_PER_HOUR),
    };
    Ok(hours)
}

/// `Occurred: X, Created: Y, Delta: Nhrs`
pub fn format_dates(occurred: &str, created: &str) -> Result<String, FormatError> {
    let delta = delta_hours(occurred, created)?;
    Ok(format!("Occurred: {}, Created: {}, Delta: {}hrs", occurred, created, delta))
}

/// First line of `body`, cut to [`BLURB_LEN`] characters
pub fn blurb(body: &str) -> String {
    body.split('\n').next().unwrap_or_default().chars().take(BLURB_LEN).collect()
}

/// Summary of a log entry for `list logs`
///
/// `occurred` is passed separately since it may come from the log entry's
/// associated event rather than the entry itself.
pub fn summarize_log_entry(log: &Record, occurred: &str) -> Result<String, FormatError> {
    let id = log.text("id").ok_or(FormatError::MissingField("id"))?;
    let ids = match log.text("event").filter(|e| !e.is_empty()) {
        Some(event) => format!("{} -e {}", id, event),
        None => id,
    };

    let created = log.text("created").ok_or(FormatError::MissingField("created"))?;
    let dates = format_dates(occurred, &created)?;
    let tags = format!("Tags: {}", log.tags().join(", "));
    let blurb = blurb(log.body().unwrap_or_default());

    Ok([ids, dates, tags, blurb].join("\n"))
}

/// Context windows around every case-insensitive occurrence of `term` in `body`
pub fn search_matches(body: &str, term: &str) -> Result<Vec<String>, FormatError> {
    let pattern = format!(
        r".{{0,{n}}}\S*{term}\S*.{{0,{n}}}",
        n = SEARCH_CONTEXT,
        term = regex::escape(term)
    );
    let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
    Ok(regex.find_iter(body).map(|m| m.as_str().to_string()).collect())
}

/// Numbered match list, or `No matches`
pub fn format_matches(matches: &[String]) -> String {
    if matches.is_empty() {
        return "No matches".to_string();
    }
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| format!("[{}]: \"{}\"", i, m))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Log entry summary with search matches appended when a term is given
pub fn format_log_entry(log: &Record, occurred: &str, search_term: Option<&str>) -> Result<String, FormatError> {
    let summary = summarize_log_entry(log, occurred)?;
    match search_term {
        Some(term) => {
            let matches = search_matches(log.body().unwrap_or_default(), term)?;
            Ok(format!("{}{}{}", summary, SEARCH_SEPARATOR, format_matches(&matches)))
        }
        None => Ok(summary),
    }
}

/// First `width` characters of `text`
pub fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Whitespace-aligned table with a dashed header rule
///
/// Columns whose cells are all numeric are right-aligned.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let numeric: Vec<bool> = (0..columns)
        .map(|i| {
            !rows.is_empty()
                && rows
                    .iter()
                    .all(|row| row.get(i).is_some_and(|c| c.parse::<f64>().is_ok()))
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if numeric[i] {
                    format!("{:>width$}", cell, width = widths[i])
                } else {
                    format!("{:<width$}", cell, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(headers.to_vec()));
    lines.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in rows {
        let cells = (0..columns).map(|i| row.get(i).map(String::as_str).unwrap_or("")).collect();
        lines.push(line(cells));
    }
    lines.join("\n")
}

pub const TAG_HEADERS: &[&str] = &["tag name", "tags"];

pub fn tag_row(tag: &Record) -> Vec<String> {
    vec![
        truncate(&tag.text("name").unwrap_or_default(), COLUMN_WIDTH),
        truncate(&tag.tags().join(","), COLUMN_WIDTH),
    ]
}

pub const EVENT_HEADERS: &[&str] = &[
    "category",
    "occurred",
    "weight",
    "description",
    "#logs",
    "#artifacts",
    "eventId",
];

fn count(record: &Record, field: &str) -> usize {
    match record.get(field) {
        Some(Value::Array(items)) => items.len(),
        _ => 0,
    }
}

pub fn event_row(event: &Record) -> Vec<String> {
    let cell = |field: &str| truncate(&event.text(field).unwrap_or_default(), COLUMN_WIDTH);
    vec![
        cell("category"),
        cell("occurred"),
        cell("weight"),
        cell("description"),
        count(event, "logEntrys").to_string(),
        count(event, "artifacts").to_string(),
        cell("eventId"),
    ]
}

/// Display text of a JSON value; link objects show their title
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .get("title")
            .map(value_text)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// Every field of an event, description cut to [`EVENT_DETAIL_WIDTH`] plus `..`
pub fn event_detail(event: &Record) -> String {
    event
        .iter()
        .map(|(key, value)| {
            let text = value_text(value);
            if key == "description" && text.chars().count() > EVENT_DETAIL_WIDTH {
                format!("{}: {}..", key, truncate(&text, EVENT_DETAIL_WIDTH))
            } else {
                format!("{}: {}", key, text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Artifact list of an event, `None` when it has none
pub fn format_artifacts(event: &Record) -> Option<String> {
    let Some(Value::Array(artifacts)) = event.get("artifacts") else {
        return None;
    };
    if artifacts.is_empty() {
        return None;
    }

    let lines: Vec<String> = artifacts
        .iter()
        .map(|artifact| {
            let title = artifact.get("title").map(value_text).unwrap_or_default();
            match artifact.get("href").and_then(Value::as_str) {
                Some(href) => format!("  - {} ({})", title, href),
                None => format!("  - {}", title),
            }
        })
        .collect();
    Some(format!("Artifacts:\n{}", lines.join("\n")))
}
