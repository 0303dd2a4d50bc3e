//! Staging controller.
//!
//! Ordinary changes are staged in one command; forced files are staged one
//! by one so a single bad path cannot block the rest of the batch.

use std::collections::BTreeSet;

use tracing::info;

use shipline_core::VcsBackend;

use crate::error::DeployError;
use crate::run_log::RunLog;

/// What happened to each forced file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ForceStageSummary {
    pub staged: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

pub struct StagingController<'a> {
    vcs: &'a dyn VcsBackend,
}

impl<'a> StagingController<'a> {
    pub fn new(vcs: &'a dyn VcsBackend) -> Self {
        Self { vcs }
    }

    /// Stage all ordinary changes except `exclude`. Failure aborts the run.
    pub async fn stage_all(&self, exclude: &[String]) -> Result<(), DeployError> {
        self.vcs
            .stage_all(exclude)
            .await
            .map_err(DeployError::StageAll)?;
        info!("✓ staged working-tree changes");
        Ok(())
    }

    /// Force-stage `forced_files` in order.
    ///
    /// Paths in `absent` are skipped with a warning. A path that fails to
    /// stage is recorded as an error and the loop moves on.
    pub async fn force_stage(
        &self,
        forced_files: &[String],
        absent: &BTreeSet<String>,
        log: &mut RunLog,
    ) -> ForceStageSummary {
        let mut summary = ForceStageSummary::default();

        for path in forced_files {
            if absent.contains(path) {
                log.warn(format!("skipped forced file {path}: not found"));
                summary.skipped.push(path.clone());
                continue;
            }

            match self.vcs.force_stage(path).await {
                Ok(()) => {
                    info!(path = %path, "✓ force-staged");
                    summary.staged.push(path.clone());
                }
                Err(source) => {
                    log.record(&DeployError::Staging {
                        path: path.clone(),
                        source,
                    });
                    summary.failed.push(path.clone());
                }
            }
        }

        summary
    }
}
