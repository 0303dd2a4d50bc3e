//! Deployment pipeline orchestration.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use shipline_core::{CommitOutcome, DeploymentConfig, VcsBackend};

use crate::error::DeployError;
use crate::inspector::{RepositoryInspector, RepositoryStatus};
use crate::publish::CommitPublishController;
use crate::report::{DeploymentReport, ReportBuilder};
use crate::run_log::RunLog;
use crate::stage::PipelineState;
use crate::staging::{ForceStageSummary, StagingController};
use crate::verifier::{FileCheckReport, PreconditionVerifier};

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The persisted report.
    pub report: DeploymentReport,

    /// Where the report was written.
    pub report_path: PathBuf,

    /// Terminal state of the run.
    pub final_state: PipelineState,

    /// Commit outcome, if the run got that far.
    pub commit: Option<CommitOutcome>,

    /// Forced-file results, if the run got that far.
    pub forced: Option<ForceStageSummary>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Read-only checks a deployment would start with.
#[derive(Debug)]
pub struct Preflight {
    pub required: FileCheckReport,
    pub forced: FileCheckReport,
    pub repository: Result<RepositoryStatus, DeployError>,
}

impl Preflight {
    /// Whether a deployment would get past verification and inspection.
    pub fn ready(&self) -> bool {
        self.required.success()
            && matches!(&self.repository, Ok(status) if status.is_expected_repository)
    }
}

/// Mutable progress of one run.
struct Run<'a> {
    log: &'a mut RunLog,
    state: PipelineState,
    commit: Option<CommitOutcome>,
    forced: Option<ForceStageSummary>,
}

impl Run<'_> {
    fn enter(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "pipeline transition");
        self.state = next;
    }
}

/// Files Shipline itself writes into the working tree (report and lock),
/// relative to `workdir`. They are never staged by `stage_all`.
fn own_files(config: &DeploymentConfig, workdir: &Path) -> Vec<String> {
    [&config.report_path, &config.lock_path]
        .into_iter()
        .filter_map(|path| {
            let relative = if path.is_absolute() {
                path.strip_prefix(workdir).ok()?
            } else {
                path.as_path()
            };
            relative.to_str().map(str::to_string)
        })
        .collect()
}

/// Deployment pipeline orchestrator.
pub struct DeployPipeline;

impl DeployPipeline {
    /// Run verify → inspect → stage → commit → publish, then build and
    /// persist the report.
    ///
    /// Fatal stage failures end up in the report, not in the returned
    /// `Result`; only a failure to persist the report is returned as an
    /// error.
    pub async fn run(
        vcs: &dyn VcsBackend,
        config: &DeploymentConfig,
        workdir: &Path,
    ) -> Result<PipelineResult, DeployError> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, workdir = %workdir.display(), "starting deployment");

        let mut log = RunLog::new();
        let mut run = Run {
            log: &mut log,
            state: PipelineState::Start,
            commit: None,
            forced: None,
        };

        if let Err(err) = Self::execute(vcs, config, workdir, &mut run).await {
            let stage = run.state.stage().map(|s| s.name());
            error!(stage = ?stage, "deployment aborted");
            run.log.record(&err);
        }
        run.enter(PipelineState::Reporting);

        let final_state = if run.log.is_aborted() {
            PipelineState::Aborted
        } else {
            PipelineState::Succeeded
        };
        let commit = run.commit.take();
        let forced = run.forced.take();

        let report = ReportBuilder::build(log, config, run_id, Utc::now());
        let report_path = workdir.join(&config.report_path);
        report.persist(&report_path)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            status = ?report.status,
            report = %report_path.display(),
            duration_ms,
            "deployment finished"
        );

        Ok(PipelineResult {
            report,
            report_path,
            final_state,
            commit,
            forced,
            duration_ms,
        })
    }

    async fn execute(
        vcs: &dyn VcsBackend,
        config: &DeploymentConfig,
        workdir: &Path,
        run: &mut Run<'_>,
    ) -> Result<(), DeployError> {
        run.enter(PipelineState::Verifying);
        let required = PreconditionVerifier::verify(workdir, &config.required_files);
        if !required.success() {
            return Err(DeployError::Precondition {
                missing: required.missing().iter().cloned().collect(),
            });
        }
        info!(count = required.present().len(), "✓ required files present");
        let forced = PreconditionVerifier::verify(workdir, &config.forced_files);

        run.enter(PipelineState::Inspecting);
        let inspector =
            RepositoryInspector::new(vcs, &config.remote, &config.repository_identifier);
        let status = inspector.inspect().await?;
        inspector.ensure_expected(&status)?;
        info!(remote_url = %status.remote_url, "✓ repository confirmed");
        if status.current_branch != config.branch {
            run.log.warn(format!(
                "current branch is '{}' but publishing '{}'",
                status.current_branch, config.branch
            ));
        }
        if !status.has_uncommitted_changes {
            info!("working tree clean");
        }

        run.enter(PipelineState::Staging);
        let staging = StagingController::new(vcs);
        staging.stage_all(&own_files(config, workdir)).await?;
        run.forced = Some(
            staging
                .force_stage(&config.forced_files, forced.missing(), run.log)
                .await,
        );

        run.enter(PipelineState::Committing);
        let publisher = CommitPublishController::new(vcs, &config.remote);
        run.commit = Some(
            publisher
                .commit(config.commit_message.as_deref(), Utc::now())
                .await?,
        );

        run.enter(PipelineState::Publishing);
        publisher.publish(&config.branch).await?;
        Ok(())
    }

    /// Run the non-mutating checks only: file verification and repository
    /// inspection. Writes nothing.
    pub async fn preflight(
        vcs: &dyn VcsBackend,
        config: &DeploymentConfig,
        workdir: &Path,
    ) -> Preflight {
        let required = PreconditionVerifier::verify(workdir, &config.required_files);
        let forced = PreconditionVerifier::verify(workdir, &config.forced_files);
        let inspector =
            RepositoryInspector::new(vcs, &config.remote, &config.repository_identifier);
        let repository = inspector.inspect().await;
        Preflight {
            required,
            forced,
            repository,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipline_core::fakes::{FakeVcs, VcsCall};

    #[tokio::test]
    async fn test_run_reaches_succeeded() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = FakeVcs::new();
        let config = DeploymentConfig::new("acme/site");

        let result = DeployPipeline::run(&vcs, &config, dir.path()).await.unwrap();
        assert_eq!(result.final_state, PipelineState::Succeeded);
        assert!(result.report.is_success());
        assert!(result.report_path.exists());
    }

    #[test]
    fn test_own_files_relative_to_workdir() {
        let mut config = DeploymentConfig::new("acme/site");
        assert_eq!(
            own_files(&config, Path::new("/srv/site")),
            vec!["deployment-report.json", ".shipline.lock"]
        );

        config.report_path = PathBuf::from("/srv/site/out/report.json");
        config.lock_path = PathBuf::from("/var/lock/shipline.lock");
        assert_eq!(
            own_files(&config, Path::new("/srv/site")),
            vec!["out/report.json"]
        );
    }

    #[tokio::test]
    async fn test_report_and_lock_are_not_staged() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = FakeVcs::new().with_changes(&["deployment-report.json", ".shipline.lock"]);
        let config = DeploymentConfig::new("acme/site");

        let result = DeployPipeline::run(&vcs, &config, dir.path()).await.unwrap();
        assert!(result.report.is_success());
        assert_eq!(result.commit, Some(CommitOutcome::NothingToCommit));
        assert!(vcs.calls().contains(&VcsCall::StageAll {
            exclude: vec![
                "deployment-report.json".to_string(),
                ".shipline.lock".to_string()
            ],
        }));
    }

    #[tokio::test]
    async fn test_branch_mismatch_warns_only() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = FakeVcs::new().with_branch("feature");
        let config = DeploymentConfig::new("acme/site");

        let result = DeployPipeline::run(&vcs, &config, dir.path()).await.unwrap();
        assert!(result.report.is_success());
        assert_eq!(result.report.warnings.len(), 1);
        assert!(result.report.warnings[0].contains("feature"));
    }

    #[tokio::test]
    async fn test_report_write_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blocker"), "file").unwrap();
        let vcs = FakeVcs::new();
        let mut config = DeploymentConfig::new("acme/site");
        config.report_path = PathBuf::from("blocker/report.json");

        let err = DeployPipeline::run(&vcs, &config, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Report { .. }));
    }

    #[tokio::test]
    async fn test_preflight_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = FakeVcs::new().with_changes(&["index.html"]);
        let mut config = DeploymentConfig::new("acme/site");
        config.required_files = vec!["index.html".to_string()];

        let preflight = DeployPipeline::preflight(&vcs, &config, dir.path()).await;
        assert!(!preflight.ready());
        assert!(preflight.required.missing().contains("index.html"));
        assert!(vcs.mutating_calls().is_empty());
        assert!(!dir.path().join("deployment-report.json").exists());
    }
}
