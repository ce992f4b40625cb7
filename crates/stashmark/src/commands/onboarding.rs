use anyhow::Result;
use libstashmark::{EditorResolver, FilePreferenceStore, OnboardingStepEngine};

use super::Context;
use crate::{
    editor::EnvEditorResolver,
    output::Output,
    snapshot::{is_tutorial_repo, read_snapshot},
};

/// Engine wired to the on-disk preferences and the environment editor.
type Engine = OnboardingStepEngine<FilePreferenceStore, EnvEditorResolver>;

/// Build the engine for `ctx`.
fn engine(ctx: &Context) -> Result<Engine> {
    let store = FilePreferenceStore::new(&ctx.state_dir);
    Ok(OnboardingStepEngine::new(
        store,
        EnvEditorResolver::default(),
    )?)
}

/// Run the `stashmark onboarding status` command logic.
pub async fn status(ctx: &Context, output: &dyn Output) -> Result<()> {
    let engine = engine(ctx)?;
    let tutorial = is_tutorial_repo(&ctx.git, &ctx.repo_path)?;
    let snapshot = read_snapshot(&ctx.git, &ctx.repo_path)?;

    let step = engine.current_step(tutorial, &snapshot).await;
    output.item("step", &step.to_string())?;
    if let Some(editor) = engine.editor().resolved_editor() {
        output.item("editor", &editor)?;
    }
    Ok(())
}

/// Run the `stashmark onboarding skip-editor` command logic.
pub fn skip_editor(ctx: &Context, output: &dyn Output) -> Result<()> {
    engine(ctx)?.skip_install_editor()?;
    output.success("Editor step skipped")?;
    Ok(())
}

/// Run the `stashmark onboarding skip-pr` command logic.
pub fn skip_pr(ctx: &Context, output: &dyn Output) -> Result<()> {
    engine(ctx)?.skip_create_pr()?;
    output.success("Pull request step skipped")?;
    Ok(())
}
