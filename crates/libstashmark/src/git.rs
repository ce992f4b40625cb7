use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::debug;

use crate::error::{Result, StashmarkError};

/// Environment variable that overrides the git binary.
pub const GIT_ENV_VAR: &str = "STASHMARK_GIT";

/// Captured result of a git invocation that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Diagnostic output, lossily decoded.
    pub stderr: String,
}

/// Seam over the external version-control tool.
///
/// Implementations run one command per call. A command that exits with a
/// non-zero status must be reported as [`StashmarkError::GitError`] whose
/// `message` carries the tool's diagnostic text, so callers can classify it.
pub trait GitRunner {
    /// Run git with `args` inside `repo_path`.
    fn run(&self, repo_path: &Path, args: &[&str]) -> Result<GitOutput>;
}

/// Process-spawning [`GitRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    /// Path or name of the git binary.
    binary: String,
}

impl Default for Git {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Git {
    /// Create a runner for an explicit git binary.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Create a runner from `$STASHMARK_GIT`, falling back to `git`.
    pub fn from_env() -> Result<Self> {
        let binary = binary_from_env_value(env::var_os(GIT_ENV_VAR))?;
        Ok(Self::new(binary))
    }

    /// The git binary this runner invokes.
    pub fn binary(&self) -> &str {
        &self.binary
    }
}

/// Resolve the binary name from the raw environment value.
///
/// Unset, empty and whitespace-only values select `git`.
fn binary_from_env_value(value: Option<OsString>) -> Result<String> {
    let Some(value) = value else {
        return Ok("git".to_string());
    };
    let value = value.into_string().map_err(|raw| {
        StashmarkError::ContextError(format!("${GIT_ENV_VAR} is not valid UTF-8: {raw:?}"))
    })?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Ok("git".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

impl GitRunner for Git {
    fn run(&self, repo_path: &Path, args: &[&str]) -> Result<GitOutput> {
        let command = format!("git {}", args.join(" "));
        debug!(repo = %repo_path.display(), %command, "running git");

        let output = Command::new(&self.binary)
            .current_dir(repo_path)
            .args(args)
            .output()
            .map_err(|source| StashmarkError::GitSpawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        debug!(%command, status = ?output.status.code(), "git finished");

        if !output.status.success() {
            return Err(StashmarkError::GitError {
                command,
                message: stderr.trim().to_string(),
            });
        }

        Ok(GitOutput { stdout, stderr })
    }
}

/// Walk up from `start_dir` to find the nearest repository root containing a `.git` entry.
pub fn find_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}
