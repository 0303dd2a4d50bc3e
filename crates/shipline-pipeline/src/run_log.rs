//! Per-run accumulator for errors and warnings.

use tracing::{error, warn};

use crate::error::DeployError;
use crate::stage::Stage;

/// Append-only record of everything that went wrong during one run.
///
/// Owned by the run, threaded through each stage by `&mut`, and consumed
/// when the report is built.
#[derive(Debug, Default)]
pub struct RunLog {
    errors: Vec<String>,
    warnings: Vec<String>,
    failed_stage: Option<Stage>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err`. A fatal error also marks the run as aborted at its
    /// stage; a recoverable one lets the run continue.
    pub fn record(&mut self, err: &DeployError) {
        if err.is_fatal() {
            self.abort(err);
        } else {
            self.error(err);
        }
    }

    fn error(&mut self, err: &DeployError) {
        error!(stage = ?err.stage().map(|s| s.name()), "{err}");
        self.errors.push(err.to_string());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.push(message);
    }

    fn abort(&mut self, err: &DeployError) {
        self.error(err);
        self.failed_stage = err.stage();
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        self.failed_stage
    }

    pub fn is_aborted(&self) -> bool {
        self.failed_stage.is_some()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<String>, Option<Stage>) {
        (self.errors, self.warnings, self.failed_stage)
    }
}
