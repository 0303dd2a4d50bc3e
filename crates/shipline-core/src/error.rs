//! Error taxonomy for the core layer: command execution, version control,
//! configuration and the working-tree lock.

use std::path::PathBuf;

/// Errors produced by the command executor.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("command must not be empty")]
    EmptyCommand,

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed (exit code {code:?}): {message}")]
    Failed {
        command: String,
        code: Option<i32>,
        message: String,
    },

    #[error("`{command}` timed out after {timeout_secs} seconds")]
    TimedOut { command: String, timeout_secs: u64 },
}

/// Errors produced by a version-control backend.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("unexpected {query} output: {output:?}")]
    UnexpectedOutput { query: &'static str, output: String },
}

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors produced by the working-tree lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("another deployment is already running against this working tree (lock {path}{holder})")]
    Held { path: PathBuf, holder: String },

    #[error("lock file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display_carries_command_and_message() {
        let err = CommandError::Failed {
            command: "git push origin main".to_string(),
            code: Some(128),
            message: "rejected".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("git push origin main"));
        assert!(msg.contains("rejected"));
        assert!(msg.contains("128"));
    }

    #[test]
    fn test_timed_out_display() {
        let err = CommandError::TimedOut {
            command: "git status".to_string(),
            timeout_secs: 5,
        };
        assert!(err.to_string().contains("timed out after 5 seconds"));
    }

    #[test]
    fn test_vcs_error_is_transparent_over_command_error() {
        let err: VcsError = CommandError::EmptyCommand.into();
        assert_eq!(err.to_string(), "command must not be empty");
    }

    #[test]
    fn test_lock_held_display() {
        let err = LockError::Held {
            path: PathBuf::from(".shipline.lock"),
            holder: ", pid 42".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains(".shipline.lock"));
        assert!(msg.contains("pid 42"));
    }
}
