//! Deployment configuration.
//!
//! Loaded once from `shipline.toml` at process start and never mutated
//! afterwards. CLI flags may override individual fields before the run
//! begins.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "shipline.toml";

/// Immutable description of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    /// Files force-staged despite ignore rules, in staging order.
    #[serde(default)]
    pub forced_files: Vec<String>,

    /// Files that must exist before anything is staged.
    #[serde(default)]
    pub required_files: Vec<String>,

    /// Substring the remote URL must contain.
    pub repository_identifier: String,

    /// Branch to publish.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Remote to publish to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// URLs to check by hand once the deployment is live.
    #[serde(default)]
    pub verification_urls: Vec<String>,

    /// Where the JSON report is written, relative to the working directory.
    /// Never staged by a deployment.
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,

    /// Lock file guarding the working tree against concurrent runs. Kept
    /// between runs and never staged.
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,

    /// Per-command timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Commit message; a timestamped default is used when absent.
    #[serde(default)]
    pub commit_message: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_report_path() -> PathBuf {
    PathBuf::from("deployment-report.json")
}

fn default_lock_path() -> PathBuf {
    PathBuf::from(".shipline.lock")
}

fn default_timeout_secs() -> u64 {
    120
}

impl DeploymentConfig {
    /// A config with defaults for everything except the repository identifier.
    pub fn new(repository_identifier: impl Into<String>) -> Self {
        Self {
            forced_files: Vec::new(),
            required_files: Vec::new(),
            repository_identifier: repository_identifier.into(),
            branch: default_branch(),
            remote: default_remote(),
            verification_urls: Vec::new(),
            report_path: default_report_path(),
            lock_path: default_lock_path(),
            command_timeout_secs: default_timeout_secs(),
            commit_message: None,
        }
    }

    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository_identifier.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "repository_identifier must not be empty".to_string(),
            ));
        }
        if self.branch.trim().is_empty() {
            return Err(ConfigError::Invalid("branch must not be empty".to_string()));
        }
        if self.remote.trim().is_empty() {
            return Err(ConfigError::Invalid("remote must not be empty".to_string()));
        }
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "command_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
