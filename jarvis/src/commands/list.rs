use colored::Colorize;
use eyre::{Result, eyre};
use tracing::{debug, warn};

use super::Context;
use crate::api::Listing;
use crate::format::{self, EVENT_HEADERS, TAG_HEADERS};
use crate::record::{EventCategory, Record, ResourceKind};

/// Rows shown per page of `list events`
pub const EVENTS_PAGE_SIZE: usize = 25;

const EVENTS_PROMPT: &str = "What's next? {more/show/done}: ";

/// Warn that a listing stopped early, after printing what did arrive
fn report_incomplete(ctx: &mut Context<'_>, listing: &Listing) -> Result<()> {
    if let Some(err) = &listing.error {
        writeln!(
            ctx.out,
            "{} listing is incomplete, stopped after {} items: {}",
            "Warning:".yellow(),
            listing.items.len(),
            err
        )?;
    }
    Ok(())
}

/// When a log entry happened: its event's time if it has one, else its own
fn occurred_of(ctx: &Context<'_>, log: &Record) -> Result<String> {
    match log.text("event").filter(|e| !e.is_empty()) {
        Some(event_id) => {
            let event = ctx
                .client
                .get(ResourceKind::Event, &event_id)?
                .ok_or_else(|| eyre!("associated event {} not found", event_id))?;
            event
                .text("occurred")
                .ok_or_else(|| eyre!("associated event {} has no occurred time", event_id))
        }
        None => log
            .text("occurred")
            .ok_or_else(|| eyre!("log entry has no occurred time")),
    }
}

fn summarize(ctx: &Context<'_>, log: &Record, search: Option<&str>) -> Result<String> {
    let occurred = occurred_of(ctx, log)?;
    Ok(format::format_log_entry(log, &occurred, search)?)
}

/// `jarvis list logs [-t TAG] [-s TERM]`
///
/// Entries print newest page last from the server, so the order is reversed
/// to put the last item first. A record whose summary cannot be built is
/// reported in place without stopping the listing.
pub fn list_logs(ctx: &mut Context<'_>, tag: Option<&str>, search: Option<&str>) -> Result<()> {
    debug!(?tag, ?search, "list_logs: called");
    let listing = ctx.client.query(
        ResourceKind::LogEntry,
        &[
            ("tags", tag.map(str::to_string)),
            ("searchterm", search.map(str::to_string)),
        ],
    );

    if listing.items.is_empty() {
        writeln!(ctx.out, "No log entries found")?;
        return report_incomplete(ctx, &listing);
    }

    let summaries: Vec<String> = listing
        .items
        .iter()
        .rev()
        .map(|log| {
            summarize(ctx, log, search).unwrap_or_else(|e| {
                let id = log.text("id").unwrap_or_default();
                warn!(%id, error = %e, "list_logs: failed to summarize");
                format!("{} log entry {}: {}", "Failed to summarize".red(), id, e)
            })
        })
        .collect();

    writeln!(ctx.out, "{}", summaries.join("\n\n"))?;
    writeln!(ctx.out, "\n\nLog entries found: {}", summaries.len())?;
    report_incomplete(ctx, &listing)
}

/// `jarvis list tags [-n NAME] [-a ASSOC]`
pub fn list_tags(ctx: &mut Context<'_>, name: Option<&str>, assoc: Option<&str>) -> Result<()> {
    debug!(?name, ?assoc, "list_tags: called");
    let listing = ctx.client.query(
        ResourceKind::Tag,
        &[("name", name.map(str::to_string)), ("tags", assoc.map(str::to_string))],
    );

    if listing.items.is_empty() {
        writeln!(ctx.out, "No tags found")?;
    } else {
        let rows: Vec<Vec<String>> = listing.items.iter().map(format::tag_row).collect();
        writeln!(ctx.out, "{}", format::render_table(TAG_HEADERS, &rows))?;
    }
    report_incomplete(ctx, &listing)
}

/// `jarvis list events [--category C] [-w WEIGHT]`
///
/// Prints a page of rows at a time and asks what to do next.
pub fn list_events(ctx: &mut Context<'_>, category: Option<EventCategory>, weight: Option<i64>) -> Result<()> {
    debug!(?category, ?weight, "list_events: called");
    let listing = ctx.client.query(
        ResourceKind::Event,
        &[
            ("category", category.map(|c| c.as_str().to_string())),
            ("weight", weight.map(|w| w.to_string())),
        ],
    );

    if listing.items.is_empty() {
        writeln!(ctx.out, "No events found")?;
        return report_incomplete(ctx, &listing);
    }
    report_incomplete(ctx, &listing)?;

    let mut pages = listing.items.chunks(EVENTS_PAGE_SIZE);
    let mut current = pages.next().unwrap_or_default();
    print_events(ctx, current)?;

    while !current.is_empty() {
        let Some(answer) = ctx.prompt.ask(EVENTS_PROMPT)? else {
            break;
        };
        match answer.as_str() {
            "more" => {
                current = pages.next().unwrap_or_default();
                if !current.is_empty() {
                    print_events(ctx, current)?;
                }
            }
            "show" => {
                let Some(which) = ctx.prompt.ask("Which?: ")? else {
                    break;
                };
                match which.parse::<usize>().ok().and_then(|i| current.get(i)) {
                    Some(event) => writeln!(ctx.out, "{}", format::event_detail(event))?,
                    None => writeln!(ctx.out, "No event at index {}", which)?,
                }
            }
            "done" => break,
            _ => {}
        }
    }
    Ok(())
}

fn print_events(ctx: &mut Context<'_>, events: &[Record]) -> Result<()> {
    let rows: Vec<Vec<String>> = events.iter().map(format::event_row).collect();
    writeln!(ctx.out, "{}", format::render_table(EVENT_HEADERS, &rows))?;
    Ok(())
}
