//! Deployment report: built once at the end of a run and written to disk.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shipline_core::DeploymentConfig;

use crate::error::DeployError;
use crate::run_log::RunLog;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Success,
    Failed,
}

/// Final, structured outcome of one deployment run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub verification_urls: Vec<String>,
    pub next_steps: Vec<String>,
}

impl DeploymentReport {
    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }

    /// Write the report as pretty JSON to `path`, replacing any previous one.
    ///
    /// The JSON goes to a temporary file next to `path` which is then renamed
    /// into place, so readers never observe a half-written report.
    pub fn persist(&self, path: &Path) -> Result<(), DeployError> {
        let report_err = |source| DeployError::Report {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_string_pretty(self)?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(report_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(report_err)?;
        tmp.write_all(json.as_bytes()).map_err(report_err)?;
        tmp.write_all(b"\n").map_err(report_err)?;
        tmp.persist(path).map_err(|e| report_err(e.error))?;
        Ok(())
    }
}

pub struct ReportBuilder;

impl ReportBuilder {
    /// Finalize a run's log into a report. Consumes the log.
    pub fn build(
        log: RunLog,
        config: &DeploymentConfig,
        run_id: Uuid,
        now: DateTime<Utc>,
    ) -> DeploymentReport {
        let (errors, warnings, failed_stage) = log.into_parts();
        let status = if errors.is_empty() {
            ReportStatus::Success
        } else {
            ReportStatus::Failed
        };

        DeploymentReport {
            run_id,
            timestamp: now,
            status,
            failed_stage,
            errors,
            warnings,
            verification_urls: config.verification_urls.clone(),
            next_steps: next_steps(status, failed_stage, config),
        }
    }
}

/// Follow-up checklist for the operator.
///
/// Success gets the post-publish verification list. Failure guidance is
/// specific to the stage that aborted the run; errors recorded without an
/// abort (forced files that failed to stage) get the generic list.
pub fn next_steps(
    status: ReportStatus,
    failed_stage: Option<Stage>,
    config: &DeploymentConfig,
) -> Vec<String> {
    if status == ReportStatus::Success {
        let mut steps = vec![format!(
            "Confirm {}/{} shows the new commit",
            config.remote, config.branch
        )];
        steps.extend(
            config
                .verification_urls
                .iter()
                .map(|url| format!("Open {url} and check the page loads")),
        );
        steps.push("Check the browser console for script errors".to_string());
        steps.push("Hard-refresh to rule out stale cached assets".to_string());
        return steps;
    }

    let specific: Vec<String> = match failed_stage {
        Some(Stage::Verify) => vec![
            "Build or restore the missing files listed in errors".to_string(),
            "Re-run the deployment once every required file exists".to_string(),
        ],
        Some(Stage::Inspect) => vec![
            format!(
                "Run from a clone whose '{}' remote contains '{}'",
                config.remote, config.repository_identifier
            ),
            "Check the version-control tool is installed and the directory is a repository"
                .to_string(),
        ],
        Some(Stage::Stage) => vec![
            "Check for a stale index lock or permission problems in the working tree".to_string(),
        ],
        Some(Stage::Commit) => vec![
            "Check the committer identity is configured".to_string(),
            "Check commit hooks for rejections".to_string(),
        ],
        Some(Stage::Publish) => vec![
            format!(
                "Pull or rebase {}/{} if the push was rejected as non-fast-forward",
                config.remote, config.branch
            ),
            "Check credentials and network access to the remote".to_string(),
        ],
        None => vec!["Fix the files that failed to stage and re-run".to_string()],
    };

    let mut steps = specific;
    steps.push("Review the errors above".to_string());
    steps.push("Re-run the deployment after fixing them".to_string());
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> DeploymentConfig {
        let mut config = DeploymentConfig::new("acme/site");
        config.verification_urls = vec!["https://acme.example/".to_string()];
        config
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_log_is_success() {
        let report = ReportBuilder::build(RunLog::new(), &config(), Uuid::new_v4(), now());
        assert!(report.is_success());
        assert!(report.errors.is_empty());
        assert_eq!(report.verification_urls, vec!["https://acme.example/"]);
        assert!(report
            .next_steps
            .iter()
            .any(|s| s.contains("https://acme.example/")));
    }

    #[test]
    fn test_warnings_never_fail() {
        let mut log = RunLog::new();
        log.warn("skipped forced file x.js: not found");
        let report = ReportBuilder::build(log, &config(), Uuid::new_v4(), now());
        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_any_error_fails() {
        let mut log = RunLog::new();
        log.record(&DeployError::Staging {
            path: "a.js".to_string(),
            source: shipline_core::VcsError::UnexpectedOutput {
                query: "add",
                output: String::new(),
            },
        });
        let report = ReportBuilder::build(log, &config(), Uuid::new_v4(), now());
        assert_eq!(report.status, ReportStatus::Failed);
        assert!(report.failed_stage.is_none());
    }

    #[test]
    fn test_next_steps_keyed_by_failed_stage() {
        let cfg = config();
        let verify = next_steps(ReportStatus::Failed, Some(Stage::Verify), &cfg);
        let publish = next_steps(ReportStatus::Failed, Some(Stage::Publish), &cfg);
        assert_ne!(verify, publish);
        assert!(verify[0].contains("missing files"));
        assert!(publish[0].contains("origin/main"));
    }

    #[test]
    fn test_json_shape() {
        let mut log = RunLog::new();
        log.record(&DeployError::Precondition {
            missing: vec!["missing.txt".to_string()],
        });
        let report = ReportBuilder::build(log, &config(), Uuid::new_v4(), now());
        let v = serde_json::to_value(&report).unwrap();
        let obj = v.as_object().unwrap();
        for key in [
            "runId",
            "timestamp",
            "status",
            "failedStage",
            "errors",
            "warnings",
            "verificationUrls",
            "nextSteps",
        ] {
            assert!(obj.contains_key(key), "missing key: {key}");
        }
        assert_eq!(v["status"], "FAILED");
        assert_eq!(v["failedStage"], "verify");
        assert_eq!(v["timestamp"], "2026-03-01T12:00:00Z");
    }

    #[test]
    fn test_success_omits_failed_stage() {
        let report = ReportBuilder::build(RunLog::new(), &config(), Uuid::new_v4(), now());
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["status"], "SUCCESS");
        assert!(v.get("failedStage").is_none());
    }

    #[test]
    fn test_persist_writes_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("deployment-report.json");

        let first = ReportBuilder::build(RunLog::new(), &config(), Uuid::new_v4(), now());
        first.persist(&path).unwrap();
        let second = ReportBuilder::build(RunLog::new(), &config(), Uuid::new_v4(), now());
        second.persist(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: DeploymentReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded, second);
    }
}
