//! Commit and publish controller.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use shipline_core::{CommitOutcome, VcsBackend};

use crate::error::DeployError;

/// Commit message used when none is configured.
pub fn default_commit_message(now: DateTime<Utc>) -> String {
    format!("Deploy: {}", now.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub struct CommitPublishController<'a> {
    vcs: &'a dyn VcsBackend,
    remote: &'a str,
}

impl<'a> CommitPublishController<'a> {
    pub fn new(vcs: &'a dyn VcsBackend, remote: &'a str) -> Self {
        Self { vcs, remote }
    }

    /// Commit the staged index. An empty index is a no-op, not an error.
    pub async fn commit(
        &self,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, DeployError> {
        let message = match message {
            Some(m) => m.to_string(),
            None => default_commit_message(now),
        };

        let outcome = self
            .vcs
            .commit(&message)
            .await
            .map_err(DeployError::Commit)?;
        match &outcome {
            CommitOutcome::Created { summary } => {
                info!(message = %message, summary = %summary, "✓ committed");
            }
            CommitOutcome::NothingToCommit => info!("nothing to commit"),
        }
        Ok(outcome)
    }

    /// Push `branch` to the configured remote.
    pub async fn publish(&self, branch: &str) -> Result<(), DeployError> {
        self.vcs
            .push(self.remote, branch)
            .await
            .map_err(|source| DeployError::Publish {
                remote: self.remote.to_string(),
                branch: branch.to_string(),
                source,
            })?;
        info!(remote = %self.remote, branch = %branch, "✓ published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shipline_core::fakes::FakeVcs;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_default_message_embeds_timestamp() {
        assert_eq!(
            default_commit_message(fixed_now()),
            "Deploy: 2026-03-01T12:30:00Z"
        );
    }

    #[tokio::test]
    async fn test_commit_uses_default_message() {
        let vcs = FakeVcs::new().with_changes(&["index.html"]);
        vcs.stage_all(&[]).await.unwrap();
        let outcome = CommitPublishController::new(&vcs, "origin")
            .commit(None, fixed_now())
            .await
            .unwrap();
        assert!(matches!(outcome, CommitOutcome::Created { .. }));
        assert_eq!(vcs.commits(), vec!["Deploy: 2026-03-01T12:30:00Z"]);
    }

    #[tokio::test]
    async fn test_commit_nothing_staged_is_noop() {
        let vcs = FakeVcs::new();
        let outcome = CommitPublishController::new(&vcs, "origin")
            .commit(Some("custom"), fixed_now())
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::NothingToCommit);
    }

    #[tokio::test]
    async fn test_commit_failure_is_fatal() {
        let vcs = FakeVcs::new().failing("commit");
        let err = CommitPublishController::new(&vcs, "origin")
            .commit(None, fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Commit(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_publish_pushes_branch_to_remote() {
        let vcs = FakeVcs::new();
        CommitPublishController::new(&vcs, "origin")
            .publish("gh-pages")
            .await
            .unwrap();
        assert_eq!(
            vcs.pushed(),
            vec![("origin".to_string(), "gh-pages".to_string())]
        );
    }

    #[tokio::test]
    async fn test_publish_failure_is_fatal() {
        let vcs = FakeVcs::new().failing("push");
        let err = CommitPublishController::new(&vcs, "origin")
            .publish("main")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Publish { .. }));
    }
}
