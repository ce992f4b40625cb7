//! Tagging and discovery of stash entries created by stashmark.
//!
//! Entries are claimed by embedding a marker message in the stash label:
//! `!!Stashmark<branch@tipsha>`. Listing reads the stash reflog and keeps only
//! lines whose subject carries that marker.

use std::{path::Path, sync::LazyLock};

use regex::Regex;
use tracing::{debug, trace};

use crate::{
    error::{Result, StashmarkError},
    git::GitRunner,
};

/// Literal prefix that marks a stash entry as created by stashmark.
pub const STASH_ENTRY_MARKER: &str = "!!Stashmark";

/// Diagnostic fragments that mean "this repository has no stash at all".
pub const BENIGN_STASH_DIAGNOSTICS: &[&str] = &["fatal: ambiguous argument 'refs/stash'"];

/// Arguments for the stash reflog query, one `<sha>@<subject>` line per entry.
const STASH_REFLOG_ARGS: &[&str] = &["log", "-g", "refs/stash", "--pretty=format:%H@%gs"];

/// Outer shape of a reflog line: the stash commit id, then the subject.
static STASH_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-f]{40})@(.+)$").expect("stash line pattern is valid")
});

/// Marker grammar inside a reflog subject. The tip token accepts any
/// alphanumeric case, unlike the strictly lowercase outer id.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{}<(.+)@([0-9a-zA-Z]{{40}})>$",
        regex::escape(STASH_ENTRY_MARKER)
    ))
    .expect("marker pattern is valid")
});

/// A stash entry owned by stashmark.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StashEntry {
    /// Branch recorded in the marker message.
    branch_name: String,
    /// Commit id of the stash object itself.
    stash_sha: String,
}

impl StashEntry {
    /// Name of the branch the entry was stashed from.
    pub fn branch_name(&self) -> &str {
        &self.branch_name
    }

    /// Commit id of the stash object (not the branch tip it was taken from).
    pub fn stash_sha(&self) -> &str {
        &self.stash_sha
    }
}

/// Build the marker message that labels an owned stash entry.
pub fn encode_marker_message(branch_name: &str, tip_sha: &str) -> String {
    format!("{STASH_ENTRY_MARKER}<{branch_name}@{tip_sha}>")
}

/// Decode one reflog line, returning `None` for foreign or malformed lines.
pub fn decode_stash_line(line: &str) -> Option<StashEntry> {
    let Some(captures) = STASH_LINE_RE.captures(line) else {
        trace!(line, "rejected malformed stash line");
        return None;
    };
    let stash_sha = captures.get(1)?.as_str();
    let subject = captures.get(2)?.as_str();

    let Some(branch_name) = branch_from_subject(subject) else {
        trace!(line, "rejected foreign stash entry");
        return None;
    };

    Some(StashEntry {
        branch_name,
        stash_sha: stash_sha.to_string(),
    })
}

/// Extract the branch from a subject like `On main: !!Stashmark<main@...>`.
fn branch_from_subject(subject: &str) -> Option<String> {
    let message = subject.split(':').map(str::trim).nth(1)?;
    let captures = MARKER_RE.captures(message)?;
    let branch_name = captures.get(1)?.as_str();
    if branch_name.is_empty() {
        return None;
    }
    Some(branch_name.to_string())
}

/// How a failed stash query should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The repository simply has no stash data.
    Benign,
    /// Anything else; the caller must see it.
    Unexpected,
}

/// Classify external-tool failure text by substring match.
pub fn classify_failure(message: &str) -> FailureClass {
    if BENIGN_STASH_DIAGNOSTICS
        .iter()
        .any(|fragment| message.contains(fragment))
    {
        FailureClass::Benign
    } else {
        FailureClass::Unexpected
    }
}

/// Read the raw stash reflog, most recent first. A missing stash ref yields
/// no lines.
fn stash_reflog(git: &dyn GitRunner, repo_path: &Path) -> Result<Vec<String>> {
    match git.run(repo_path, STASH_REFLOG_ARGS) {
        Ok(output) => Ok(output
            .stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(err @ StashmarkError::GitError { .. }) => match classify_failure(&err.to_string()) {
            FailureClass::Benign => {
                debug!(repo = %repo_path.display(), "no stash ref, treating as empty");
                Ok(Vec::new())
            }
            FailureClass::Unexpected => Err(err),
        },
        Err(err) => Err(err),
    }
}

/// List every stash entry owned by stashmark, in the tool's native order.
pub fn list_owned_entries(git: &dyn GitRunner, repo_path: &Path) -> Result<Vec<StashEntry>> {
    Ok(stash_reflog(git, repo_path)?
        .iter()
        .map(String::as_str)
        .filter_map(decode_stash_line)
        .collect())
}

/// Stash the working directory under a marker message for `branch_name`.
///
/// `tip_sha` should be the full id of the branch tip. Any diagnostic output
/// from git is treated as failure, even when the command exited cleanly.
pub fn create_owned_stash_entry(
    git: &dyn GitRunner,
    repo_path: &Path,
    branch_name: &str,
    tip_sha: &str,
) -> Result<()> {
    let message = encode_marker_message(branch_name, tip_sha);
    let output = git.run(
        repo_path,
        &["stash", "push", "--include-untracked", "-m", &message],
    )?;

    if !output.stderr.is_empty() {
        return Err(StashmarkError::StashCreation(output.stderr));
    }

    Ok(())
}

/// Return the most recent owned entry recorded for `branch_name`.
pub fn last_owned_entry_for_branch(
    git: &dyn GitRunner,
    repo_path: &Path,
    branch_name: &str,
) -> Result<Option<StashEntry>> {
    Ok(list_owned_entries(git, repo_path)?
        .into_iter()
        .find(|entry| entry.branch_name == branch_name))
}

/// Position of the owned entry `stash_sha` in the full stash reflog.
///
/// Foreign entries count toward the position but are never a match.
fn stash_index(git: &dyn GitRunner, repo_path: &Path, stash_sha: &str) -> Result<usize> {
    stash_reflog(git, repo_path)?
        .iter()
        .position(|line| {
            decode_stash_line(line).is_some_and(|entry| entry.stash_sha == stash_sha)
        })
        .ok_or_else(|| StashmarkError::EntryNotFound {
            sha: stash_sha.to_string(),
        })
}

/// Delete the stash entry with id `stash_sha` without applying it.
pub fn drop_owned_entry(git: &dyn GitRunner, repo_path: &Path, stash_sha: &str) -> Result<()> {
    let index = stash_index(git, repo_path, stash_sha)?;
    git.run(repo_path, &["stash", "drop", &format!("stash@{{{index}}}")])?;
    Ok(())
}

/// Apply the stash entry with id `stash_sha` to the working directory and remove it.
pub fn pop_owned_entry(git: &dyn GitRunner, repo_path: &Path, stash_sha: &str) -> Result<()> {
    let index = stash_index(git, repo_path, stash_sha)?;
    git.run(repo_path, &["stash", "pop", &format!("stash@{{{index}}}")])?;
    Ok(())
}
