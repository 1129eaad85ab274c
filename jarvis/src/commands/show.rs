use eyre::{Context as _, Result, eyre};
use tracing::debug;

use super::Context;
use crate::codec;
use crate::editor::{buffer_path, write_buffer};
use crate::format;
use crate::record::{Record, ResourceKind};

/// Text of the show view, with an event's artifacts appended
pub fn render_show(kind: ResourceKind, record: &Record) -> String {
    let mut text = codec::encode(kind, &kind.show_fields(), record);
    if kind == ResourceKind::Event
        && let Some(artifacts) = format::format_artifacts(record)
    {
        text.push_str(&artifacts);
        text.push('\n');
    }
    text
}

/// Write the show view to a scratch file and present it
pub fn display(ctx: &mut Context<'_>, kind: ResourceKind, id: &str, record: &Record) -> Result<()> {
    let text = render_show(kind, record);
    let path = buffer_path(&ctx.profile.scratch_dir, id)?;
    write_buffer(&path, &text)?;

    match ctx.viewer {
        Some(viewer) => viewer
            .edit(&path)
            .wrap_err_with(|| format!("Failed to view {}", path.display()))?,
        None => write!(ctx.out, "{}", text)?,
    }
    Ok(())
}

/// `jarvis show {log|tag|event} ID`
pub fn show_resource(ctx: &mut Context<'_>, kind: ResourceKind, id: &str) -> Result<()> {
    debug!(%kind, %id, "show_resource: called");
    let record = ctx
        .client
        .get(kind, id)
        .wrap_err_with(|| format!("Failed to fetch {} {}", kind, id))?
        .ok_or_else(|| eyre!("No {} found: {}", kind, id))?;
    display(ctx, kind, id, &record)
}
