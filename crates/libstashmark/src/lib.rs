#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Core library for stashmark: tagging git stash entries so an application can
//! tell its own entries apart from everyone else's, and tracking progress
//! through the tutorial repository.
//!
//! The external `git` process is reached through the [`GitRunner`] seam, and
//! persisted user choices through [`PreferenceStore`]. The CLI binary in
//! `crates/stashmark` builds on top of this library.

/// Error types shared by every module.
mod error;
/// Helper routines for interacting with Git repositories.
mod git;
/// Tutorial progress derived from repository state.
mod onboarding;
/// Read-only repository state consumed by the onboarding engine.
mod snapshot;
/// Marker encoding, listing and creation of owned stash entries.
mod stash;
/// Persisted boolean preferences.
mod store;

pub use error::{Result, StashmarkError};
pub use git::{GIT_ENV_VAR, Git, GitOutput, GitRunner, find_root};
pub use onboarding::{
    EditorResolver, OnboardingStep, OnboardingStepEngine, SKIP_CREATE_PR_KEY,
    SKIP_INSTALL_EDITOR_KEY,
};
pub use snapshot::{AheadBehind, Branch, Commit, PullRequestRef, RepositorySnapshot, Tip};
pub use stash::{
    BENIGN_STASH_DIAGNOSTICS, FailureClass, STASH_ENTRY_MARKER, StashEntry, classify_failure,
    create_owned_stash_entry, decode_stash_line, drop_owned_entry, encode_marker_message,
    last_owned_entry_for_branch, list_owned_entries, pop_owned_entry,
};
pub use store::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
