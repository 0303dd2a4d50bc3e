//! Git backend for the version-control boundary.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CommandError, VcsError};
use crate::executor::{display_command, CommandExecutor, ExecOptions, ExecutionResult};
use crate::vcs::{CommitOutcome, VcsBackend, VcsResult};

/// Text git prints when a commit has nothing staged.
const NOTHING_TO_COMMIT: &str = "nothing to commit";

/// [`VcsBackend`] implemented by running the `git` CLI in a working tree.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            workdir: workdir.into(),
            timeout,
        }
    }

    fn options(&self) -> ExecOptions {
        ExecOptions::in_dir(&self.workdir).with_timeout(self.timeout)
    }

    async fn git(&self, args: &[&str]) -> Result<ExecutionResult, CommandError> {
        let command = git_command(args);
        CommandExecutor::execute(&command, &self.options()).await
    }

    async fn git_capture(&self, args: &[&str]) -> Result<ExecutionResult, CommandError> {
        let command = git_command(args);
        CommandExecutor::capture(&command, &self.options()).await
    }

    /// Whether the index differs from HEAD. Uses the exit code of
    /// `git diff --cached --quiet`: 0 means clean, 1 means staged changes.
    async fn has_staged_changes(&self) -> VcsResult<bool> {
        let args = ["diff", "--cached", "--quiet"];
        let result = self.git_capture(&args).await?;
        match result.exit_code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(result
                .into_failure(&display_command(&git_command(&args)))
                .into()),
        }
    }
}

fn git_command<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let mut command = Vec::with_capacity(args.len() + 1);
    command.push("git");
    command.extend_from_slice(args);
    command
}

/// Pathspec that keeps `path` out of an `add`.
fn exclude_pathspec(path: &str) -> String {
    format!(":(exclude){path}")
}

/// Extract changed paths from `git status --porcelain` output.
///
/// Each line is `XY <path>`; renames are `XY <old> -> <new>` and report the
/// new path. Quoted paths are unquoted.
pub fn parse_porcelain(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let entry = &line[3..];
            let path = match entry.split_once(" -> ") {
                Some((_, new)) => new,
                None => entry,
            };
            path.trim_matches('"').to_string()
        })
        .collect()
}

/// Whether free-form commit output signals an empty index.
pub fn is_nothing_to_commit(message: &str) -> bool {
    message.contains(NOTHING_TO_COMMIT)
}

#[async_trait]
impl VcsBackend for GitCli {
    async fn status(&self) -> VcsResult<Vec<String>> {
        let result = self.git(&["status", "--porcelain"]).await?;
        Ok(parse_porcelain(&result.output))
    }

    async fn current_branch(&self) -> VcsResult<String> {
        // symbolic-ref also works on an unborn branch; rev-parse covers detached HEAD.
        let symbolic = self.git_capture(&["symbolic-ref", "--short", "-q", "HEAD"]).await?;
        let branch = if symbolic.exit_succeeded {
            symbolic.output
        } else {
            self.git(&["rev-parse", "--abbrev-ref", "HEAD"]).await?.output
        };
        let branch = branch.trim().to_string();
        if branch.is_empty() {
            return Err(VcsError::UnexpectedOutput {
                query: "branch",
                output: branch,
            });
        }
        Ok(branch)
    }

    async fn remote_url(&self, remote: &str) -> VcsResult<String> {
        let url = self.git(&["remote", "get-url", remote]).await?.output;
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(VcsError::UnexpectedOutput {
                query: "remote",
                output: url,
            });
        }
        Ok(url)
    }

    async fn stage_all(&self, exclude: &[String]) -> VcsResult<()> {
        let pathspecs: Vec<String> = exclude.iter().map(|p| exclude_pathspec(p)).collect();
        let mut args = vec!["add", "-A"];
        if !pathspecs.is_empty() {
            args.extend(["--", ":/"]);
            args.extend(pathspecs.iter().map(String::as_str));
        }
        self.git(&args).await?;
        Ok(())
    }

    async fn force_stage(&self, path: &str) -> VcsResult<()> {
        self.git(&["add", "-f", "--", path]).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> VcsResult<CommitOutcome> {
        if !self.has_staged_changes().await? {
            debug!("index has no staged changes");
            return Ok(CommitOutcome::NothingToCommit);
        }

        let args = ["commit", "-m", message];
        let result = self.git_capture(&args).await?;
        if result.exit_succeeded {
            let summary = result.output.lines().next().unwrap_or_default().to_string();
            return Ok(CommitOutcome::Created { summary });
        }

        let text = format!(
            "{}\n{}",
            result.output,
            result.error_message.as_deref().unwrap_or_default()
        );
        if is_nothing_to_commit(&text) {
            return Ok(CommitOutcome::NothingToCommit);
        }
        Err(result
            .into_failure(&display_command(&git_command(&args)))
            .into())
    }

    async fn push(&self, remote: &str, branch: &str) -> VcsResult<()> {
        self.git(&["push", remote, branch]).await?;
        Ok(())
    }
}
