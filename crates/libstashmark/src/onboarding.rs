//! Progress tracking for the guided tutorial repository.
//!
//! The current step is re-derived from a [`RepositorySnapshot`] on every call.
//! The only stored state is two "skipped" flags, persisted through a
//! [`PreferenceStore`].

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    error::Result,
    snapshot::RepositorySnapshot,
    store::PreferenceStore,
};

/// Preference key for skipping the editor installation step.
pub const SKIP_INSTALL_EDITOR_KEY: &str = "tutorial-install-editor-skipped";
/// Preference key for skipping the pull request step.
pub const SKIP_CREATE_PR_KEY: &str = "tutorial-pr-creation-skipped";

/// Tutorial steps in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OnboardingStep {
    /// The repository is not the tutorial repository.
    NotApplicable,
    /// No editor is available yet.
    PickEditor,
    /// The default branch is still checked out.
    CreateBranch,
    /// Nothing has been changed on the new branch.
    EditFile,
    /// Changes exist but have not been committed.
    MakeCommit,
    /// Local commits have not been pushed.
    PushBranch,
    /// No pull request exists for the branch.
    OpenPullRequest,
    /// Every step is complete.
    AllDone,
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotApplicable => "not applicable",
            Self::PickEditor => "pick an editor",
            Self::CreateBranch => "create a branch",
            Self::EditFile => "edit a file",
            Self::MakeCommit => "make a commit",
            Self::PushBranch => "push the branch",
            Self::OpenPullRequest => "open a pull request",
            Self::AllDone => "all done",
        };
        f.write_str(label)
    }
}

/// Editor discovery capability.
///
/// `resolve_editor` may be slow and is safe to call repeatedly. Failures are
/// the implementation's concern; afterwards `resolved_editor` simply reports
/// whatever is known.
#[async_trait]
pub trait EditorResolver: Send + Sync {
    /// Attempt to discover an editor.
    async fn resolve_editor(&self);
    /// The editor found so far, if any.
    fn resolved_editor(&self) -> Option<String>;
}

/// Derives the current [`OnboardingStep`] for a repository.
pub struct OnboardingStepEngine<S, E> {
    /// Where skip flags are persisted.
    store: S,
    /// Editor discovery.
    editor: E,
    /// User bypassed the editor step.
    install_editor_skipped: bool,
    /// User bypassed the pull request step.
    create_pr_skipped: bool,
}

impl<S: PreferenceStore, E: EditorResolver> OnboardingStepEngine<S, E> {
    /// Create an engine, loading both skip flags from `store`.
    pub fn new(store: S, editor: E) -> Result<Self> {
        let install_editor_skipped = store.get_bool(SKIP_INSTALL_EDITOR_KEY)?.unwrap_or(false);
        let create_pr_skipped = store.get_bool(SKIP_CREATE_PR_KEY)?.unwrap_or(false);
        Ok(Self {
            store,
            editor,
            install_editor_skipped,
            create_pr_skipped,
        })
    }

    /// The backing preference store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The injected editor resolver.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Whether the editor step has been skipped.
    pub fn install_editor_skipped(&self) -> bool {
        self.install_editor_skipped
    }

    /// Whether the pull request step has been skipped.
    pub fn create_pr_skipped(&self) -> bool {
        self.create_pr_skipped
    }

    /// Bypass the editor step for this and future sessions.
    ///
    /// The in-memory flag is set even if persisting it fails.
    pub fn skip_install_editor(&mut self) -> Result<()> {
        self.install_editor_skipped = true;
        self.store.set_bool(SKIP_INSTALL_EDITOR_KEY, true)?;
        info!("editor installation step skipped");
        Ok(())
    }

    /// Bypass the pull request step for this and future sessions.
    ///
    /// The in-memory flag is set even if persisting it fails.
    pub fn skip_create_pr(&mut self) -> Result<()> {
        self.create_pr_skipped = true;
        self.store.set_bool(SKIP_CREATE_PR_KEY, true)?;
        info!("pull request step skipped");
        Ok(())
    }

    /// Compute the first unmet step. Later predicates are only checked once
    /// every earlier one holds.
    pub async fn current_step(
        &self,
        is_tutorial_repo: bool,
        snapshot: &RepositorySnapshot,
    ) -> OnboardingStep {
        let step = if !is_tutorial_repo {
            OnboardingStep::NotApplicable
        } else if !self.is_editor_installed().await {
            OnboardingStep::PickEditor
        } else if !is_non_default_branch_checked_out(snapshot) {
            OnboardingStep::CreateBranch
        } else if !has_changed_file(snapshot) {
            OnboardingStep::EditFile
        } else if !has_multiple_commits(snapshot) {
            OnboardingStep::MakeCommit
        } else if !is_commit_pushed(snapshot) {
            OnboardingStep::PushBranch
        } else if !self.is_pull_request_created(snapshot) {
            OnboardingStep::OpenPullRequest
        } else {
            OnboardingStep::AllDone
        };
        debug!(%step, "evaluated onboarding step");
        step
    }

    /// Skipped, already resolved, or resolvable now.
    async fn is_editor_installed(&self) -> bool {
        if self.install_editor_skipped || self.editor.resolved_editor().is_some() {
            return true;
        }
        self.editor.resolve_editor().await;
        self.editor.resolved_editor().is_some()
    }

    /// Skipped, or the snapshot carries a pull request.
    fn is_pull_request_created(&self, snapshot: &RepositorySnapshot) -> bool {
        self.create_pr_skipped || snapshot.current_pull_request.is_some()
    }
}

/// A named branch other than the default one is checked out.
fn is_non_default_branch_checked_out(snapshot: &RepositorySnapshot) -> bool {
    match (snapshot.tip.valid_branch(), &snapshot.default_branch) {
        (Some(branch), Some(default_branch)) => branch.name != *default_branch,
        _ => false,
    }
}

/// The branch already has commits, or the working directory has changes.
fn has_changed_file(snapshot: &RepositorySnapshot) -> bool {
    has_multiple_commits(snapshot) || snapshot.changed_file_count > 0
}

/// The tip commit has at least one real parent.
fn has_multiple_commits(snapshot: &RepositorySnapshot) -> bool {
    snapshot
        .tip
        .valid_branch()
        .is_some_and(|branch| branch.tip.real_parents().next().is_some())
}

/// Upstream is known and nothing is waiting to be pushed.
fn is_commit_pushed(snapshot: &RepositorySnapshot) -> bool {
    snapshot
        .ahead_behind
        .is_some_and(|ahead_behind| ahead_behind.ahead == 0)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        snapshot::{AheadBehind, Branch, Commit, PullRequestRef, Tip},
        store::MemoryPreferenceStore,
    };

    /// Resolver that finds `discoverable` on the first resolution attempt.
    #[derive(Default)]
    struct FakeEditor {
        discoverable: Option<String>,
        resolved: Mutex<Option<String>>,
        resolve_calls: AtomicUsize,
    }

    impl FakeEditor {
        fn resolved(name: &str) -> Self {
            Self {
                resolved: Mutex::new(Some(name.to_string())),
                ..Self::default()
            }
        }

        fn discoverable(name: &str) -> Self {
            Self {
                discoverable: Some(name.to_string()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.resolve_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EditorResolver for FakeEditor {
        async fn resolve_editor(&self) {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            *self.resolved.lock().unwrap() = self.discoverable.clone();
        }

        fn resolved_editor(&self) -> Option<String> {
            self.resolved.lock().unwrap().clone()
        }
    }

    fn engine(editor: FakeEditor) -> OnboardingStepEngine<MemoryPreferenceStore, FakeEditor> {
        OnboardingStepEngine::new(MemoryPreferenceStore::default(), editor).unwrap()
    }

    fn on_branch(name: &str, parent_shas: &[&str]) -> RepositorySnapshot {
        RepositorySnapshot {
            tip: Tip::Valid {
                branch: Branch {
                    name: name.to_string(),
                    tip: Commit {
                        sha: "c".repeat(40),
                        parent_shas: parent_shas.iter().map(|sha| sha.to_string()).collect(),
                    },
                },
            },
            default_branch: Some("main".to_string()),
            ..RepositorySnapshot::default()
        }
    }

    const PARENT: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b";

    #[tokio::test]
    async fn non_tutorial_repo_is_not_applicable() {
        let engine = engine(FakeEditor::default());
        let step = engine.current_step(false, &on_branch("main", &[])).await;
        assert_eq!(step, OnboardingStep::NotApplicable);
        assert_eq!(engine.editor().calls(), 0);
    }

    #[tokio::test]
    async fn missing_editor_asks_to_pick_one() {
        let engine = engine(FakeEditor::default());
        let step = engine.current_step(true, &on_branch("main", &[])).await;
        assert_eq!(step, OnboardingStep::PickEditor);
        assert_eq!(engine.editor().calls(), 1);
    }

    #[tokio::test]
    async fn editor_found_by_resolution_advances() {
        let engine = engine(FakeEditor::discoverable("code"));
        let step = engine.current_step(true, &on_branch("main", &[])).await;
        assert_eq!(step, OnboardingStep::CreateBranch);
        assert_eq!(engine.editor().calls(), 1);
    }

    #[tokio::test]
    async fn resolved_editor_skips_resolution() {
        let engine = engine(FakeEditor::resolved("vim"));
        let step = engine.current_step(true, &on_branch("main", &[])).await;
        assert_eq!(step, OnboardingStep::CreateBranch);
        assert_eq!(engine.editor().calls(), 0);
    }

    #[tokio::test]
    async fn skipped_editor_on_default_branch_needs_branch() {
        let mut engine = engine(FakeEditor::default());
        engine.skip_install_editor().unwrap();
        let step = engine.current_step(true, &on_branch("main", &[])).await;
        assert_eq!(step, OnboardingStep::CreateBranch);
        assert_eq!(engine.editor().calls(), 0);
    }

    #[tokio::test]
    async fn branch_requires_known_default_and_valid_tip() {
        let engine = engine(FakeEditor::resolved("vim"));

        let mut snapshot = on_branch("topic", &[]);
        snapshot.default_branch = None;
        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::CreateBranch
        );

        let snapshot = RepositorySnapshot {
            tip: Tip::Detached { sha: "d".repeat(40) },
            default_branch: Some("main".to_string()),
            ..RepositorySnapshot::default()
        };
        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::CreateBranch
        );
    }

    #[tokio::test]
    async fn fresh_branch_needs_an_edit() {
        let engine = engine(FakeEditor::resolved("vim"));
        let step = engine.current_step(true, &on_branch("topic", &[])).await;
        assert_eq!(step, OnboardingStep::EditFile);
    }

    #[tokio::test]
    async fn pending_change_needs_a_commit() {
        let engine = engine(FakeEditor::resolved("vim"));
        let mut snapshot = on_branch("topic", &[]);
        snapshot.changed_file_count = 1;
        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::MakeCommit
        );
    }

    #[tokio::test]
    async fn empty_parent_ids_do_not_count() {
        let engine = engine(FakeEditor::resolved("vim"));
        let step = engine.current_step(true, &on_branch("topic", &["", ""])).await;
        assert_eq!(step, OnboardingStep::EditFile);
    }

    #[tokio::test]
    async fn committed_branch_without_upstream_needs_push() {
        let engine = engine(FakeEditor::resolved("vim"));
        let snapshot = on_branch("topic", &[PARENT]);
        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::PushBranch
        );
    }

    #[tokio::test]
    async fn ahead_behind_boundaries() {
        let engine = engine(FakeEditor::resolved("vim"));
        let mut snapshot = on_branch("topic", &[PARENT]);

        snapshot.ahead_behind = Some(AheadBehind { ahead: 1, behind: 0 });
        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::PushBranch
        );

        snapshot.ahead_behind = Some(AheadBehind { ahead: 0, behind: 5 });
        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::OpenPullRequest
        );
    }

    #[tokio::test]
    async fn pull_request_completes_tutorial() {
        let engine = engine(FakeEditor::resolved("vim"));
        let mut snapshot = on_branch("topic", &[PARENT]);
        snapshot.ahead_behind = Some(AheadBehind::default());
        snapshot.current_pull_request = Some(PullRequestRef { number: 1 });

        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::AllDone
        );
    }

    #[tokio::test]
    async fn skipped_pull_request_holds_for_every_snapshot() {
        let mut engine = engine(FakeEditor::resolved("vim"));
        engine.skip_create_pr().unwrap();

        let mut snapshot = on_branch("topic", &[PARENT]);
        snapshot.ahead_behind = Some(AheadBehind::default());
        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::AllDone
        );
        snapshot.current_pull_request = Some(PullRequestRef { number: 7 });
        assert_eq!(
            engine.current_step(true, &snapshot).await,
            OnboardingStep::AllDone
        );
    }

    #[tokio::test]
    async fn evaluation_is_repeatable() {
        let engine = engine(FakeEditor::resolved("vim"));
        let mut snapshot = on_branch("topic", &[PARENT]);
        snapshot.changed_file_count = 3;

        let first = engine.current_step(true, &snapshot).await;
        let second = engine.current_step(true, &snapshot).await;
        assert_eq!(first, second);
    }

    #[test]
    fn skips_are_persisted_and_reloaded() {
        let store = MemoryPreferenceStore::default();
        store.set_bool(SKIP_CREATE_PR_KEY, true).unwrap();

        let mut engine = OnboardingStepEngine::new(store, FakeEditor::default()).unwrap();
        assert!(engine.create_pr_skipped());
        assert!(!engine.install_editor_skipped());

        engine.skip_install_editor().unwrap();
        assert_eq!(
            engine.store().get_bool(SKIP_INSTALL_EDITOR_KEY).unwrap(),
            Some(true)
        );
    }

    #[test]
    fn steps_are_ordered_by_precedence() {
        assert!(OnboardingStep::NotApplicable < OnboardingStep::PickEditor);
        assert!(OnboardingStep::MakeCommit < OnboardingStep::PushBranch);
        assert!(OnboardingStep::OpenPullRequest < OnboardingStep::AllDone);
    }
}
