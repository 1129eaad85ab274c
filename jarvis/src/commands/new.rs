use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use eyre::{Context as _, Result, eyre};
use serde_json::Value;
use tracing::{debug, info};

use super::{Context, display, report_tag_creation};
use crate::api::PostOptions;
use crate::codec;
use crate::editor::{buffer_path, edit_buffer, generate_id};
use crate::record::{BODY_FIELD, EventCategory, Record, ResourceKind, TAGS_FIELD};

/// Value of `source` on events created here
pub const EVENT_SOURCE: &str = concat!("jarvis-cli:", env!("CARGO_PKG_VERSION"));

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NEW_TAG_FIELDS: &[&str] = &["name", "author", TAGS_FIELD];
const NEW_LOG_FIELDS: &[&str] = &["author", "occurred", TAGS_FIELD, "parent", "event", "todo"];

/// Parse a user-typed date; accepts RFC 3339 and a few shorter forms
pub fn parse_occurred(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn ask(ctx: &mut Context<'_>, question: &str) -> Result<String> {
    ctx.prompt.ask(question)?.ok_or_else(|| eyre!("Aborted"))
}

/// Create a record from an edited buffer, creating missing tags first
fn submit(ctx: &mut Context<'_>, kind: ResourceKind, text: &str) -> Result<Record> {
    let record = codec::decode(kind, text)?;
    let request = codec::to_request(&record);

    let (tags, created) = ctx.client.create_tagged(kind, &ctx.profile.author, &request);
    report_tag_creation(ctx.out, &tags)?;
    created.wrap_err_with(|| format!("Failed to create {}", kind))
}

/// `jarvis new tag NAME`
pub fn new_tag(ctx: &mut Context<'_>, name: &str) -> Result<()> {
    debug!(%name, "new_tag: called");
    writeln!(ctx.out, "Checking if tag already exists: {}", name)?;
    if ctx.client.get(ResourceKind::Tag, &name.to_lowercase())?.is_some() {
        writeln!(ctx.out, "Tag already exists: {}", name)?;
        return Ok(());
    }

    let mut stub = Record::new();
    stub.insert("name", name);
    stub.insert("author", ctx.profile.author.as_str());
    stub.insert(TAGS_FIELD, Value::Array(Vec::new()));
    stub.insert(BODY_FIELD, format!("# {}", name));

    let path = buffer_path(&ctx.profile.scratch_dir, name)?;
    let initial = codec::encode(ResourceKind::Tag, NEW_TAG_FIELDS, &stub);
    let text = edit_buffer(ctx.editor, &path, &initial)?;

    let created = submit(ctx, ResourceKind::Tag, &text)
        .wrap_err_with(|| format!("Buffer kept at {}", path.display()))?;
    let id = ResourceKind::Tag.id_of(&created).unwrap_or_else(|| name.to_string());
    display(ctx, ResourceKind::Tag, &id, &created)?;
    writeln!(ctx.out, "\nCreated: {}", id)?;
    info!(%id, "new_tag: created");
    Ok(())
}

/// `jarvis new log [--event-id EVENT]`
pub fn new_log(ctx: &mut Context<'_>, event: Option<&str>) -> Result<()> {
    debug!(?event, "new_log: called");
    let now = Utc::now();

    let mut stub = Record::new();
    stub.insert("author", ctx.profile.author.as_str());
    stub.insert("occurred", now.format(TIMESTAMP_FORMAT).to_string());
    stub.insert(TAGS_FIELD, Value::Array(Vec::new()));
    stub.insert("parent", Value::Null);
    stub.insert("event", event.map(Value::from).unwrap_or(Value::Null));
    stub.insert("todo", Value::Null);
    stub.insert(BODY_FIELD, "");

    let path = buffer_path(&ctx.profile.scratch_dir, &generate_id(now))?;
    let initial = codec::encode(ResourceKind::LogEntry, NEW_LOG_FIELDS, &stub);
    let text = edit_buffer(ctx.editor, &path, &initial)?;

    let created = submit(ctx, ResourceKind::LogEntry, &text)
        .wrap_err_with(|| format!("Buffer kept at {}", path.display()))?;
    let id = ResourceKind::LogEntry
        .id_of(&created)
        .ok_or_else(|| eyre!("Created log entry has no id"))?;
    display(ctx, ResourceKind::LogEntry, &id, &created)?;
    writeln!(ctx.out, "\nCreated: {}", id)?;
    info!(%id, "new_log: created");
    Ok(())
}

/// `jarvis new event`
pub fn new_event(ctx: &mut Context<'_>) -> Result<()> {
    debug!("new_event: called");

    let occurred = loop {
        let answer = ask(ctx, "When occurred [default: now]?: ")?;
        if answer.is_empty() {
            break Utc::now().naive_utc();
        }
        match parse_occurred(&answer) {
            Some(dt) => break dt,
            None => writeln!(ctx.out, "Could not understand date: {}", answer)?,
        }
    };

    let question = format!("Event category [options: {}]: ", EventCategory::names());
    let category = loop {
        if let Ok(category) = ask(ctx, &question)?.parse::<EventCategory>() {
            break category;
        }
    };

    let question = format!("Event weight [default: {}]: ", category.default_weight());
    let weight = loop {
        let answer = ask(ctx, &question)?;
        if answer.is_empty() {
            break category.default_weight();
        }
        if let Ok(weight) = answer.parse::<i64>() {
            break weight;
        }
    };

    let name = format!("jarvis_event_{}", generate_id(occurred.and_utc()));
    let path = buffer_path(&ctx.profile.scratch_dir, &name)?;
    let description = edit_buffer(ctx.editor, &path, "")?;

    let mut request = Record::new();
    request.insert("occurred", occurred.format(TIMESTAMP_FORMAT).to_string());
    request.insert("category", category.as_str());
    request.insert("source", EVENT_SOURCE);
    request.insert("weight", weight);
    request.insert("description", description.trim_end_matches('\n'));

    let created = ctx
        .client
        .post(ResourceKind::Event, &request, PostOptions::default())
        .wrap_err_with(|| format!("Failed to create event; description kept at {}", path.display()))?;
    let id = ResourceKind::Event.id_of(&created).unwrap_or_default();
    writeln!(ctx.out, "Created: {}", id)?;
    info!(%id, "new_event: created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::{Method, MockTransport};
    use crate::commands::testing::{run, unchanged};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_parse_occurred_formats() {
        assert_eq!(
            parse_occurred("2016-03-04").unwrap().to_string(),
            "2016-03-04 00:00:00"
        );
        assert_eq!(
            parse_occurred("2016-03-04 13:30").unwrap().to_string(),
            "2016-03-04 13:30:00"
        );
        assert_eq!(
            parse_occurred("2016-03-04T13:30:05+02:00").unwrap().to_string(),
            "2016-03-04 11:30:05"
        );
        assert!(parse_occurred("last tuesday").is_none());
    }

    #[test]
    fn test_new_tag_already_exists() {
        let transport = Arc::new(MockTransport::new().on(
            Method::Get,
            "http://localhost:3000/tags/weather",
            200,
            json!({"name": "Weather"}),
        ));

        let (result, out) = run(&transport, unchanged, &[], |ctx| new_tag(ctx, "Weather"));
        result.unwrap();
        assert!(out.contains("Tag already exists: Weather"));
        assert!(transport.requests().iter().all(|r| r.method == Method::Get));
    }

    #[test]
    fn test_new_tag_submits_edited_buffer() {
        let transport = Arc::new(MockTransport::new().on(
            Method::Post,
            "http://localhost:3000/tags",
            201,
            json!({"name": "Weather", "author": "Jane Doe", "tagsLink": [], "body": "# Weather\nRain."}),
        ));

        let (result, out) = run(
            &transport,
            |text: &str| format!("{}\nRain.", text),
            &[],
            |ctx| new_tag(ctx, "Weather"),
        );
        result.unwrap();
        assert!(out.ends_with("\nCreated: Weather\n"));

        let post = transport
            .requests()
            .into_iter()
            .find(|r| r.method == Method::Post)
            .unwrap();
        assert_eq!(
            post.body,
            Some(json!({"name": "Weather", "author": "Jane Doe", "tags": [], "body": "# Weather\nRain."}))
        );
    }

    #[test]
    fn test_new_tag_with_slash_in_name() {
        let transport = Arc::new(MockTransport::new().on(
            Method::Post,
            "http://localhost:3000/tags",
            201,
            json!({"name": "CI/CD", "author": "Jane Doe", "tagsLink": [], "body": "# CI/CD"}),
        ));

        let (result, out) = run(&transport, unchanged, &[], |ctx| new_tag(ctx, "CI/CD"));
        result.unwrap();
        assert!(out.ends_with("\nCreated: CI/CD\n"));

        let requests = transport.requests();
        assert_eq!(requests[0].url, "http://localhost:3000/tags/ci%2Fcd");
        let post = requests.iter().find(|r| r.method == Method::Post).unwrap();
        assert_eq!(post.body.as_ref().unwrap()["name"], json!("CI/CD"));
    }

    #[test]
    fn test_new_log_creates_missing_tag_first() {
        let transport = Arc::new(
            MockTransport::new()
                .on(Method::Post, "http://localhost:3000/tags", 201, json!({"name": "NewTag"}))
                .on(
                    Method::Post,
                    "http://localhost:3000/logentries",
                    201,
                    json!({"id": 7, "author": "Jane Doe", "tagsLink": [{"title": "NewTag"}], "body": "Hello"}),
                ),
        );

        let (result, out) = run(
            &transport,
            |text: &str| format!("{}Hello", text.replace("Tags: ", "Tags: NewTag")),
            &[],
            |ctx| new_log(ctx, Some("ev-1")),
        );
        result.unwrap();
        assert!(out.contains("Created missing tag: NewTag"));
        assert!(out.ends_with("\nCreated: 7\n"));

        let posts: Vec<_> = transport
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Post)
            .collect();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "http://localhost:3000/tags");

        let log = posts[1].body.as_ref().unwrap();
        assert_eq!(log["tags"], json!(["NewTag"]));
        assert_eq!(log["event"], json!("ev-1"));
        assert_eq!(log["parent"], Value::Null);
        assert_eq!(log["body"], json!("Hello"));
    }

    #[test]
    fn test_new_log_rejected_keeps_buffer_path_in_error() {
        let transport = Arc::new(MockTransport::new().on(
            Method::Post,
            "http://localhost:3000/logentries",
            400,
            json!({"error": "bad occurred"}),
        ));

        let (result, _) = run(&transport, unchanged, &[], |ctx| new_log(ctx, None));
        let err = format!("{:?}", result.unwrap_err());
        assert!(err.contains("Buffer kept at"));
        assert!(err.contains("bad occurred"));
    }

    #[test]
    fn test_new_event_prompts_and_posts() {
        let transport = Arc::new(MockTransport::new().on(
            Method::Post,
            "http://localhost:3000/events",
            201,
            json!({"eventId": "ev-42"}),
        ));

        let (result, out) = run(
            &transport,
            |_: &str| "Watched a film\n".to_string(),
            &["2016-03-04 20:00", "nonsense", "consumed", "lots", ""],
            |ctx| new_event(ctx),
        );
        result.unwrap();
        assert_eq!(out, "Created: ev-42\n");

        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body["occurred"], json!("2016-03-04T20:00:00"));
        assert_eq!(body["category"], json!("consumed"));
        assert_eq!(body["weight"], json!(100));
        assert_eq!(body["source"], json!(EVENT_SOURCE));
        assert_eq!(body["description"], json!("Watched a film"));
    }

    #[test]
    fn test_new_event_aborts_on_end_of_input() {
        let transport = Arc::new(MockTransport::new());
        let (result, _) = run(&transport, unchanged, &["", "consumed"], |ctx| new_event(ctx));
        assert!(result.unwrap_err().to_string().contains("Aborted"));
        assert!(transport.requests().is_empty());
    }
}
