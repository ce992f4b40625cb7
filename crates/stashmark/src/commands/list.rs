use anyhow::Result;
use libstashmark::{StashEntry, list_owned_entries};

use super::Context;
use crate::output::Output;

/// Run the `stashmark list` command logic.
pub fn list(ctx: &Context, output: &dyn Output) -> Result<()> {
    let entries = list_owned_entries(&ctx.git, &ctx.repo_path)?;
    if entries.is_empty() {
        output.message("No stash entries found.")?;
        return Ok(());
    }

    for (position, entry) in entries.iter().enumerate() {
        render_entry(output, position, entry)?;
    }

    Ok(())
}

/// Render one owned entry.
fn render_entry(output: &dyn Output, position: usize, entry: &StashEntry) -> Result<()> {
    let section = output.section(&format!("#{position}"));
    section.item("branch", entry.branch_name())?;
    section.item("stash", entry.stash_sha())?;
    Ok(())
}
