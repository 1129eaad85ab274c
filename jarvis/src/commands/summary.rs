use eyre::{Context as _, Result};
use tracing::debug;

use super::Context;
use crate::format::{self, value_text};
use crate::record::ResourceKind;

const SUMMARIZED: [ResourceKind; 2] = [ResourceKind::Tag, ResourceKind::LogEntry];

/// `jarvis summary`
///
/// One table row per collection. Columns are the keys of the tag summary and
/// each row holds its summary's values in server order.
pub fn summary(ctx: &mut Context<'_>) -> Result<()> {
    debug!("summary: called");
    let mut summaries = Vec::with_capacity(SUMMARIZED.len());
    for kind in SUMMARIZED {
        let summary = ctx
            .client
            .data_summary(kind)
            .wrap_err_with(|| format!("Failed to fetch {} summary", kind))?;
        summaries.push(summary);
    }

    let headers: Vec<&str> = summaries[0].keys().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|summary| summary.values().map(value_text).collect())
        .collect();

    writeln!(ctx.out, "{}", format::render_table(&headers, &rows))?;
    Ok(())
}
