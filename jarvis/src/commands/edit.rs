use eyre::{Context as _, Result, eyre};
use tracing::{debug, info};

use super::{Context, display, report_tag_creation};
use crate::codec;
use crate::editor::{buffer_path, edit_buffer};
use crate::record::ResourceKind;

/// `jarvis edit {log|tag|event} ID`
///
/// Fetches the resource, opens its edit view, then submits the result as an
/// update. The scratch file stays behind if anything after editing fails.
pub fn edit_resource(ctx: &mut Context<'_>, kind: ResourceKind, id: &str) -> Result<()> {
    debug!(%kind, %id, "edit_resource: called");
    let record = ctx
        .client
        .get(kind, id)
        .wrap_err_with(|| format!("Failed to fetch {} {}", kind, id))?
        .ok_or_else(|| eyre!("No {} found: {}", kind, id))?;

    let path = buffer_path(&ctx.profile.scratch_dir, id)?;
    let initial = codec::encode(kind, &kind.edit_fields(), &record);
    let text = edit_buffer(ctx.editor, &path, &initial)?;

    let edited = codec::decode(kind, &text).wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
    let request = codec::to_request(&edited);

    let updated = if kind.has_tags() {
        let (tags, updated) = ctx.client.update_tagged(kind, id, &ctx.profile.author, &request);
        report_tag_creation(ctx.out, &tags)?;
        updated
    } else {
        ctx.client.put(kind, id, &request)
    }
    .wrap_err_with(|| format!("Failed to update {} {}; buffer kept at {}", kind, id, path.display()))?;

    display(ctx, kind, id, &updated)?;
    writeln!(ctx.out, "\nEdited: {}", id)?;
    info!(%kind, %id, "edit_resource: updated");
    Ok(())
}
