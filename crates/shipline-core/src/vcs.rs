//! Version-control boundary.
//!
//! The pipeline never talks to a concrete tool. It needs the logical
//! operations below: working-tree status, current branch, remote URL,
//! staging (ordinary and forced), commit and push. [`crate::git::GitCli`]
//! is the production backend and [`crate::fakes::FakeVcs`] the test double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VcsError;

pub type VcsResult<T> = std::result::Result<T, VcsError>;

/// Outcome of a commit attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// A new commit was recorded.
    Created { summary: String },

    /// The index had nothing staged; no commit was made.
    NothingToCommit,
}

#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Paths with uncommitted changes, one per changed entry, in tool order.
    async fn status(&self) -> VcsResult<Vec<String>>;

    /// Name of the checked-out branch.
    async fn current_branch(&self) -> VcsResult<String>;

    /// URL configured for `remote`.
    async fn remote_url(&self, remote: &str) -> VcsResult<String>;

    /// Stage all ordinary tracked and untracked changes except the paths in
    /// `exclude` (relative to the working tree).
    async fn stage_all(&self, exclude: &[String]) -> VcsResult<()>;

    /// Stage a single path even if ignore rules exclude it.
    async fn force_stage(&self, path: &str) -> VcsResult<()>;

    /// Record a commit of the staged index.
    async fn commit(&self, message: &str) -> VcsResult<CommitOutcome>;

    /// Push `branch` to `remote`.
    async fn push(&self, remote: &str, branch: &str) -> VcsResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_outcome_serde_tags() {
        let v = serde_json::to_value(CommitOutcome::NothingToCommit).unwrap();
        assert_eq!(v["outcome"], "nothing_to_commit");

        let v = serde_json::to_value(CommitOutcome::Created {
            summary: "1 file changed".to_string(),
        })
        .unwrap();
        assert_eq!(v["outcome"], "created");
        assert_eq!(v["summary"], "1 file changed");
    }
}
