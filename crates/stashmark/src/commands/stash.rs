use anyhow::{Context as _, Result};
use libstashmark::{
    create_owned_stash_entry, drop_owned_entry, last_owned_entry_for_branch, list_owned_entries,
    pop_owned_entry,
};

use super::Context;
use crate::{
    output::Output,
    snapshot::{current_branch, head_sha},
};

/// Resolve an explicit branch or fall back to the checked-out one.
fn branch_or_current(ctx: &Context, branch: Option<String>) -> Result<String> {
    match branch {
        Some(branch) => Ok(branch),
        None => current_branch(&ctx.git, &ctx.repo_path)
            .context("HEAD is detached; pass --branch to name the branch"),
    }
}

/// Run the `stashmark save` command logic.
pub fn save(ctx: &Context, output: &dyn Output, branch: Option<String>) -> Result<()> {
    let branch = branch_or_current(ctx, branch)?;
    let tip = head_sha(&ctx.git, &ctx.repo_path)
        .context("Repository has no commits yet; nothing to stash against")?;

    // git exits cleanly with nothing to save, so confirm a new entry exists.
    let newest_before = list_owned_entries(&ctx.git, &ctx.repo_path)?.into_iter().next();
    create_owned_stash_entry(&ctx.git, &ctx.repo_path, &branch, &tip)?;
    let newest_after = list_owned_entries(&ctx.git, &ctx.repo_path)?.into_iter().next();
    if newest_after.is_none() || newest_after == newest_before {
        anyhow::bail!("No local changes to save on branch '{branch}'");
    }

    output.success(&format!("Stashed changes for {branch}"))?;
    Ok(())
}

/// Run the `stashmark restore` command logic.
pub fn restore(ctx: &Context, output: &dyn Output, branch: Option<String>) -> Result<()> {
    let branch = branch_or_current(ctx, branch)?;
    let Some(entry) = last_owned_entry_for_branch(&ctx.git, &ctx.repo_path, &branch)? else {
        output.warn(&format!("No stash entry found for branch '{branch}'"))?;
        return Ok(());
    };

    pop_owned_entry(&ctx.git, &ctx.repo_path, entry.stash_sha())?;
    output.success(&format!("Restored stashed changes for {branch}"))?;
    Ok(())
}

/// Run the `stashmark pop` command logic.
pub fn pop_entry(ctx: &Context, output: &dyn Output, stash_sha: &str) -> Result<()> {
    pop_owned_entry(&ctx.git, &ctx.repo_path, stash_sha)?;
    output.success(&format!("Applied and removed {stash_sha}"))?;
    Ok(())
}

/// Run the `stashmark drop` command logic.
pub fn drop_entry(ctx: &Context, output: &dyn Output, stash_sha: &str) -> Result<()> {
    drop_owned_entry(&ctx.git, &ctx.repo_path, stash_sha)?;
    output.success(&format!("Dropped {stash_sha}"))?;
    Ok(())
}
