use chrono::Utc;
use colored::Colorize;
use eyre::{Context as _, Result};
use std::path::Path;
use tracing::debug;

use super::Context;
use crate::admin;
use crate::api::ApiClient;
use crate::record::ResourceKind;

/// `jarvis admin backup`
pub fn backup(ctx: &mut Context<'_>) -> Result<()> {
    debug!(environment = %ctx.profile.environment, "backup: called");
    let snapshot = admin::create_snapshot(
        &ctx.profile.environment,
        &ctx.profile.data_directory,
        &ctx.profile.snapshots_directory,
        Utc::now(),
    )
    .wrap_err("Backup failed")?;
    writeln!(ctx.out, "Snapshot written: {}", snapshot.display())?;
    Ok(())
}

/// `jarvis admin restore SNAPSHOT`
pub fn restore(ctx: &mut Context<'_>, snapshot: &Path) -> Result<()> {
    debug!(snapshot = %snapshot.display(), "restore: called");
    admin::restore_snapshot(snapshot, &ctx.profile.data_directory).wrap_err("Restore failed")?;
    writeln!(
        ctx.out,
        "Restored {} into {}",
        snapshot.display(),
        ctx.profile.data_directory.display()
    )?;
    Ok(())
}

/// `jarvis admin migrate {tags|logs} --to ENV`
///
/// `target` is the client for the destination environment.
pub fn migrate(ctx: &mut Context<'_>, kind: ResourceKind, target: &ApiClient) -> Result<()> {
    debug!(%kind, to = %target.base_url(), "migrate: called");
    writeln!(
        ctx.out,
        "Migrate {}: {} -> {}",
        kind.endpoint(),
        ctx.client.base_url(),
        target.base_url()
    )?;

    let report = admin::migrate(ctx.client, target, kind)
        .wrap_err_with(|| format!("Failed to read {} from {}", kind.endpoint(), ctx.client.base_url()))?;

    for (id, err) in &report.failed {
        writeln!(ctx.out, "{} {} {}: {}", "Failed:".red(), kind, id, err)?;
    }
    writeln!(ctx.out, "{}", report.summary())?;
    Ok(())
}
