use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Return the path to the compiled `stashmark` binary for integration-style tests.
pub fn stashmark_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_stashmark"))
}

/// Run a git command inside `repo_path`, ensuring it succeeds.
pub fn git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    ensure!(
        output.status.success(),
        "git command failed: git {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(output)
}

/// Create a temporary repository on `main` with a README commit.
pub fn create_repo() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let repo_path = temp_dir.path().join("repo");
    fs::create_dir_all(&repo_path)?;

    git(&repo_path, &["init", "-b", "main"])?;
    git(&repo_path, &["config", "user.email", "test@example.com"])?;
    git(&repo_path, &["config", "user.name", "Test User"])?;

    fs::write(repo_path.join("README.md"), "# Test Project")?;
    git(&repo_path, &["add", "README.md"])?;
    git(&repo_path, &["commit", "-m", "Initial commit"])?;

    Ok((temp_dir, repo_path))
}

/// Run `stashmark` against `repo_path` with state kept in `state_dir`.
pub fn run_stashmark(repo_path: &Path, state_dir: &Path, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(stashmark_binary());
    cmd.current_dir(repo_path)
        .arg("--no-color")
        .arg("--dir")
        .arg(state_dir)
        .args(args)
        .env_remove("VISUAL")
        .env_remove("EDITOR")
        .env_remove("STASHMARK_GIT")
        .env_remove("STASHMARK_LOG");
    cmd.output()
        .with_context(|| format!("failed to run stashmark {}", args.join(" ")))
}

/// Stdout of a run, lossily decoded.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
