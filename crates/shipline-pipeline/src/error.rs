//! Deployment error taxonomy.

use std::path::PathBuf;

use shipline_core::VcsError;

use crate::stage::Stage;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("missing required file(s): {}", .missing.join(", "))]
    Precondition { missing: Vec<String> },

    #[error("remote '{remote}' ({remote_url}) does not contain repository identifier '{expected}'")]
    RepositoryIdentity {
        expected: String,
        remote: String,
        remote_url: String,
    },

    #[error("{query} query failed: {source}")]
    Query {
        query: &'static str,
        #[source]
        source: VcsError,
    },

    #[error("failed to stage changes: {0}")]
    StageAll(#[source] VcsError),

    #[error("failed to force-stage {path}: {source}")]
    Staging {
        path: String,
        #[source]
        source: VcsError,
    },

    #[error("commit failed: {0}")]
    Commit(#[source] VcsError),

    #[error("push of {branch} to {remote} failed: {source}")]
    Publish {
        remote: String,
        branch: String,
        #[source]
        source: VcsError,
    },

    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeployError {
    /// The stage this error belongs to. Report errors happen after all stages.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DeployError::Precondition { .. } => Some(Stage::Verify),
            DeployError::RepositoryIdentity { .. } | DeployError::Query { .. } => {
                Some(Stage::Inspect)
            }
            DeployError::StageAll(_) | DeployError::Staging { .. } => Some(Stage::Stage),
            DeployError::Commit(_) => Some(Stage::Commit),
            DeployError::Publish { .. } => Some(Stage::Publish),
            DeployError::Report { .. } | DeployError::Serialization(_) => None,
        }
    }

    /// Whether this error aborts the run. Only single-file staging failures
    /// are recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DeployError::Staging { .. })
    }
}
