//! Repository state inspection.

use serde::Serialize;
use tracing::debug;

use shipline_core::VcsBackend;

use crate::error::DeployError;

/// A point-in-time view of the working tree and its remote.
///
/// Never cached: call [`RepositoryInspector::inspect`] again whenever a
/// fresh view is needed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RepositoryStatus {
    pub has_uncommitted_changes: bool,
    pub changed_paths: Vec<String>,
    pub current_branch: String,
    pub remote_url: String,
    pub is_expected_repository: bool,
}

pub struct RepositoryInspector<'a> {
    vcs: &'a dyn VcsBackend,
    remote: &'a str,
    repository_identifier: &'a str,
}

impl<'a> RepositoryInspector<'a> {
    pub fn new(vcs: &'a dyn VcsBackend, remote: &'a str, repository_identifier: &'a str) -> Self {
        Self {
            vcs,
            remote,
            repository_identifier,
        }
    }

    /// Query status, branch and remote URL. Any query failure is an error.
    pub async fn inspect(&self) -> Result<RepositoryStatus, DeployError> {
        let changed_paths = self
            .vcs
            .status()
            .await
            .map_err(|source| DeployError::Query {
                query: "status",
                source,
            })?;
        let current_branch =
            self.vcs
                .current_branch()
                .await
                .map_err(|source| DeployError::Query {
                    query: "branch",
                    source,
                })?;
        let remote_url =
            self.vcs
                .remote_url(self.remote)
                .await
                .map_err(|source| DeployError::Query {
                    query: "remote",
                    source,
                })?;

        let is_expected_repository = remote_url.contains(self.repository_identifier);
        debug!(
            branch = %current_branch,
            remote_url = %remote_url,
            changed = changed_paths.len(),
            is_expected_repository,
            "inspected repository"
        );

        Ok(RepositoryStatus {
            has_uncommitted_changes: !changed_paths.is_empty(),
            changed_paths,
            current_branch,
            remote_url,
            is_expected_repository,
        })
    }

    /// Fail unless `status` points at the expected repository.
    pub fn ensure_expected(&self, status: &RepositoryStatus) -> Result<(), DeployError> {
        if status.is_expected_repository {
            return Ok(());
        }
        Err(DeployError::RepositoryIdentity {
            expected: self.repository_identifier.to_string(),
            remote: self.remote.to_string(),
            remote_url: status.remote_url.clone(),
        })
    }
}
