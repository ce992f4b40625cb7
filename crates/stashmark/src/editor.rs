use std::{env, sync::OnceLock};

use async_trait::async_trait;
use libstashmark::EditorResolver;
use tracing::debug;

/// Resolves the user's editor from `$VISUAL`, then `$EDITOR`.
#[derive(Debug, Default)]
pub struct EnvEditorResolver {
    /// Editor found by the first successful resolution.
    resolved: OnceLock<String>,
}

/// Pick the first non-blank candidate.
fn editor_from_vars(visual: Option<String>, editor: Option<String>) -> Option<String> {
    [visual, editor]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

#[async_trait]
impl EditorResolver for EnvEditorResolver {
    async fn resolve_editor(&self) {
        if self.resolved.get().is_some() {
            return;
        }
        match editor_from_vars(env::var("VISUAL").ok(), env::var("EDITOR").ok()) {
            Some(editor) => {
                debug!(%editor, "resolved editor from environment");
                // A concurrent resolution may have won; either value is fine.
                #[allow(clippy::let_underscore_must_use)]
                let _ = self.resolved.set(editor);
            }
            None => debug!("no editor configured in environment"),
        }
    }

    fn resolved_editor(&self) -> Option<String> {
        self.resolved.get().cloned()
    }
}
