//! Shipline Core Library
//!
//! Building blocks shared by the deployment pipeline and the CLI:
//! command execution, the version-control boundary and its git backend,
//! configuration, the working-tree lock and tracing setup.

pub mod config;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod git;
pub mod lock;
pub mod telemetry;
pub mod vcs;

pub use config::{DeploymentConfig, CONFIG_FILE_NAME};
pub use error::{CommandError, ConfigError, LockError, VcsError};
pub use executor::{CommandExecutor, ExecOptions, ExecutionResult};
pub use git::GitCli;
pub use lock::WorkTreeLock;
pub use telemetry::{init_tracing, LogFormat};
pub use vcs::{CommitOutcome, VcsBackend, VcsResult};
