/// A commit as seen from the current branch tip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commit {
    /// Full commit id.
    pub sha: String,
    /// Parent commit ids. Root commits may report a spurious empty id.
    pub parent_shas: Vec<String>,
}

impl Commit {
    /// Parent ids with empty entries removed.
    pub fn real_parents(&self) -> impl Iterator<Item = &str> {
        self.parent_shas
            .iter()
            .map(String::as_str)
            .filter(|sha| !sha.is_empty())
    }
}

/// A local branch and the commit it points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branch {
    /// Short branch name, e.g. `main`.
    pub name: String,
    /// Commit at the tip of the branch.
    pub tip: Commit,
}

/// State of `HEAD` in the working repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Tip {
    /// `HEAD` points at a branch with at least one commit.
    Valid {
        /// The checked-out branch.
        branch: Branch,
    },
    /// `HEAD` points at a branch that has no commits yet.
    Unborn {
        /// The ref `HEAD` names.
        ref_name: String,
    },
    /// `HEAD` points directly at a commit.
    Detached {
        /// The checked-out commit id.
        sha: String,
    },
    /// The state could not be determined.
    #[default]
    Unknown,
}

impl Tip {
    /// The checked-out branch, when the tip is valid.
    pub fn valid_branch(&self) -> Option<&Branch> {
        match self {
            Self::Valid { branch } => Some(branch),
            _ => None,
        }
    }
}

/// Commits the local branch has diverged from its upstream by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AheadBehind {
    /// Local commits missing upstream.
    pub ahead: usize,
    /// Upstream commits missing locally.
    pub behind: usize,
}

/// Reference to an open pull request for the current branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Pull request number on the hosting service.
    pub number: u64,
}

/// Read-only view of repository state consumed by the onboarding engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySnapshot {
    /// Current `HEAD` state.
    pub tip: Tip,
    /// Name of the repository's default branch, if known.
    pub default_branch: Option<String>,
    /// Divergence from upstream, if the branch tracks one.
    pub ahead_behind: Option<AheadBehind>,
    /// Number of changed files in the working directory.
    pub changed_file_count: usize,
    /// Pull request for the current branch, if any.
    pub current_pull_request: Option<PullRequestRef>,
}
