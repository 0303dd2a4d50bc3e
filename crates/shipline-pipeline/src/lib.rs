//! Shipline Pipeline - fail-fast deployment orchestration
//!
//! Runs a deployment as a strictly sequential pipeline:
//! - Verify required files exist (precondition gate)
//! - Inspect working tree, branch and remote identity
//! - Stage ordinary changes, then force-stage declared files one by one
//! - Commit (an empty index is a no-op) and push
//! - Build and persist a structured report, whatever happened before

pub mod error;
pub mod inspector;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod run_log;
pub mod stage;
pub mod staging;
pub mod verifier;

// Re-export key types
pub use error::DeployError;
pub use inspector::{RepositoryInspector, RepositoryStatus};
pub use pipeline::{DeployPipeline, PipelineResult, Preflight};
pub use publish::{default_commit_message, CommitPublishController};
pub use report::{DeploymentReport, ReportBuilder, ReportStatus};
pub use run_log::RunLog;
pub use stage::{PipelineState, Stage};
pub use staging::{ForceStageSummary, StagingController};
pub use verifier::{FileCheckReport, PreconditionVerifier};
