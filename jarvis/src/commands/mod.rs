//! Subcommand implementations
//!
//! Each command takes a [`Context`] holding everything resolved at start-up
//! and writes its results to `ctx.out`.

mod admin;
mod edit;
mod init;
mod list;
mod new;
mod show;
mod summary;

pub use admin::{backup, migrate, restore};
pub use edit::edit_resource;
pub use init::init;
pub use list::{list_events, list_logs, list_tags};
pub use new::{new_event, new_log, new_tag, parse_occurred};
pub use show::{display, render_show, show_resource};
pub use summary::summary;

use colored::Colorize;
use eyre::Result;
use std::io::Write;

use crate::api::{ApiClient, TagCreation};
use crate::config::Profile;
use crate::editor::Editor;
use crate::prompt::Prompt;

/// Everything a command needs, resolved once per invocation
pub struct Context<'a> {
    pub profile: &'a Profile,
    pub client: &'a ApiClient,
    pub editor: &'a dyn Editor,
    /// Program showing `show` output; printed to `out` when absent
    pub viewer: Option<&'a dyn Editor>,
    pub prompt: &'a mut dyn Prompt,
    pub out: &'a mut dyn Write,
}

/// Tell the user which referenced tags were created or could not be
pub(crate) fn report_tag_creation(out: &mut dyn Write, outcome: &TagCreation) -> Result<()> {
    for name in &outcome.created {
        writeln!(out, "Created missing tag: {}", name)?;
    }
    for (name, err) in &outcome.failed {
        writeln!(out, "{} could not create tag {}: {}", "Warning:".yellow(), name, err)?;
    }
    Ok(())
}
