use std::path::Path;

use libstashmark::{
    AheadBehind, Branch, Commit, GitRunner, RepositorySnapshot, Result, StashmarkError, Tip,
};

/// Build a [`RepositorySnapshot`] by querying git.
///
/// Pull requests live on the hosting service, so none is ever reported.
pub fn read_snapshot(git: &dyn GitRunner, repo_path: &Path) -> Result<RepositorySnapshot> {
    Ok(RepositorySnapshot {
        tip: read_tip(git, repo_path),
        default_branch: default_branch(git, repo_path),
        ahead_behind: ahead_behind(git, repo_path),
        changed_file_count: changed_file_count(git, repo_path)?,
        current_pull_request: None,
    })
}

/// Name of the checked-out branch, or `None` when `HEAD` is detached.
pub fn current_branch(git: &dyn GitRunner, repo_path: &Path) -> Option<String> {
    git.run(repo_path, &["symbolic-ref", "--quiet", "--short", "HEAD"])
        .ok()
        .map(|output| output.stdout.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Full id of the `HEAD` commit, or `None` on an unborn branch.
pub fn head_sha(git: &dyn GitRunner, repo_path: &Path) -> Option<String> {
    git.run(repo_path, &["rev-parse", "--verify", "--quiet", "HEAD"])
        .ok()
        .map(|output| output.stdout.trim().to_string())
        .filter(|sha| !sha.is_empty())
}

/// Whether the repository is flagged as the tutorial via `stashmark.tutorial`.
pub fn is_tutorial_repo(git: &dyn GitRunner, repo_path: &Path) -> Result<bool> {
    match git.run(repo_path, &["config", "--get", "--bool", "stashmark.tutorial"]) {
        Ok(output) => Ok(output.stdout.trim() == "true"),
        // `git config --get` exits non-zero without diagnostics when unset.
        Err(StashmarkError::GitError { message, .. }) if message.is_empty() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Classify `HEAD`.
fn read_tip(git: &dyn GitRunner, repo_path: &Path) -> Tip {
    match (current_branch(git, repo_path), head_sha(git, repo_path)) {
        (Some(name), Some(_)) => match head_commit(git, repo_path) {
            Some(tip) => Tip::Valid {
                branch: Branch { name, tip },
            },
            None => Tip::Unknown,
        },
        (Some(name), None) => Tip::Unborn {
            ref_name: format!("refs/heads/{name}"),
        },
        (None, Some(sha)) => Tip::Detached { sha },
        (None, None) => Tip::Unknown,
    }
}

/// The `HEAD` commit with its parent ids.
fn head_commit(git: &dyn GitRunner, repo_path: &Path) -> Option<Commit> {
    let output = git
        .run(repo_path, &["rev-list", "--parents", "-n", "1", "HEAD"])
        .ok()?;
    parse_commit_line(&output.stdout)
}

/// Parse `<sha> <parent>...` as printed by `rev-list --parents`.
fn parse_commit_line(line: &str) -> Option<Commit> {
    let mut ids = line.split_whitespace().map(str::to_string);
    let sha = ids.next()?;
    Some(Commit {
        sha,
        parent_shas: ids.collect(),
    })
}

/// Default branch: the remote's `HEAD`, else the first local candidate that exists.
fn default_branch(git: &dyn GitRunner, repo_path: &Path) -> Option<String> {
    if let Ok(output) = git.run(
        repo_path,
        &["symbolic-ref", "--quiet", "--short", "refs/remotes/origin/HEAD"],
    ) {
        let name = output.stdout.trim();
        if let Some(branch) = name.strip_prefix("origin/") {
            return Some(branch.to_string());
        }
    }

    let configured = git
        .run(repo_path, &["config", "--get", "init.defaultBranch"])
        .ok()
        .map(|output| output.stdout.trim().to_string())
        .filter(|name| !name.is_empty());

    configured
        .into_iter()
        .chain(["main".to_string(), "master".to_string()])
        .find(|name| {
            git.run(
                repo_path,
                &["rev-parse", "--verify", "--quiet", &format!("refs/heads/{name}")],
            )
            .is_ok()
        })
}

/// Counts against the upstream branch, if one is configured.
fn ahead_behind(git: &dyn GitRunner, repo_path: &Path) -> Option<AheadBehind> {
    let output = git
        .run(
            repo_path,
            &["rev-list", "--left-right", "--count", "HEAD...@{upstream}"],
        )
        .ok()?;
    parse_ahead_behind(&output.stdout)
}

/// Parse `<ahead>\t<behind>`.
fn parse_ahead_behind(text: &str) -> Option<AheadBehind> {
    let mut counts = text.split_whitespace().map(str::parse::<usize>);
    let ahead = counts.next()?.ok()?;
    let behind = counts.next()?.ok()?;
    Some(AheadBehind { ahead, behind })
}

/// Number of entries in `git status --porcelain`.
fn changed_file_count(git: &dyn GitRunner, repo_path: &Path) -> Result<usize> {
    let output = git.run(
        repo_path,
        &["status", "--porcelain", "--untracked-files=all"],
    )?;
    Ok(output.stdout.lines().filter(|line| !line.is_empty()).count())
}
