use std::path::PathBuf;

use libstashmark::Git;

/// `stashmark list`.
pub mod list;
/// `stashmark onboarding ...`.
pub mod onboarding;
/// `stashmark save`, `restore`, `drop` and `pop`.
pub mod stash;

/// Resolved environment shared by every command.
pub struct Context {
    /// Git runner used for every invocation.
    pub git: Git,
    /// Root of the target repository.
    pub repo_path: PathBuf,
    /// Directory holding persisted preferences.
    pub state_dir: PathBuf,
}
