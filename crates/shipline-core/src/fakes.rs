//! In-memory fake of the version-control boundary (testing only)
//!
//! `FakeVcs` keeps a tiny model of a working tree (changed paths, staged
//! paths, branch, remote) and records every call so tests can assert on
//! side effects. Individual operations can be made to fail.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CommandError, VcsError};
use crate::vcs::{CommitOutcome, VcsBackend, VcsResult};

/// One recorded call against [`FakeVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Status,
    CurrentBranch,
    RemoteUrl(String),
    StageAll { exclude: Vec<String> },
    ForceStage(String),
    Commit(String),
    Push { remote: String, branch: String },
}

impl VcsCall {
    /// Whether this call changes repository state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            VcsCall::StageAll { .. } | VcsCall::ForceStage(_) | VcsCall::Commit(_) | VcsCall::Push { .. }
        )
    }
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<VcsCall>,
    changed: Vec<String>,
    staged: Vec<String>,
    commits: Vec<String>,
    pushed: Vec<(String, String)>,
}

/// Programmable in-memory [`VcsBackend`].
#[derive(Debug)]
pub struct FakeVcs {
    branch: String,
    remotes: BTreeMap<String, String>,
    failing: HashSet<&'static str>,
    failing_paths: HashSet<String>,
    state: Mutex<FakeState>,
}

impl Default for FakeVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeVcs {
    /// A clean tree on `main` with `origin` pointing at `https://example.com/acme/site.git`.
    pub fn new() -> Self {
        let mut remotes = BTreeMap::new();
        remotes.insert(
            "origin".to_string(),
            "https://example.com/acme/site.git".to_string(),
        );
        Self {
            branch: "main".to_string(),
            remotes,
            failing: HashSet::new(),
            failing_paths: HashSet::new(),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    pub fn with_remote(mut self, name: &str, url: &str) -> Self {
        self.remotes.insert(name.to_string(), url.to_string());
        self
    }

    pub fn with_changes(self, paths: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .changed
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    /// Make an operation fail. Names: `status`, `branch`, `remote`,
    /// `stage_all`, `commit`, `push`.
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Make `force_stage` fail for one path.
    pub fn failing_force_stage(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<VcsCall> {
        self.calls().into_iter().filter(VcsCall::is_mutating).collect()
    }

    /// Paths force-staged successfully, in call order.
    pub fn force_staged(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter_map(|c| match c {
                VcsCall::ForceStage(p) if !self.failing_paths.contains(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn commits(&self) -> Vec<String> {
        self.state.lock().unwrap().commits.clone()
    }

    pub fn pushed(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pushed.clone()
    }

    fn record(&self, call: VcsCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn check(&self, operation: &'static str, command: String) -> VcsResult<()> {
        if self.failing.contains(operation) {
            return Err(fake_failure(command, format!("{operation} failed")));
        }
        Ok(())
    }
}

fn fake_failure(command: String, message: String) -> VcsError {
    VcsError::Command(CommandError::Failed {
        command,
        code: Some(1),
        message,
    })
}

#[async_trait]
impl VcsBackend for FakeVcs {
    async fn status(&self) -> VcsResult<Vec<String>> {
        self.record(VcsCall::Status);
        self.check("status", "fake status".to_string())?;
        Ok(self.state.lock().unwrap().changed.clone())
    }

    async fn current_branch(&self) -> VcsResult<String> {
        self.record(VcsCall::CurrentBranch);
        self.check("branch", "fake branch".to_string())?;
        Ok(self.branch.clone())
    }

    async fn remote_url(&self, remote: &str) -> VcsResult<String> {
        self.record(VcsCall::RemoteUrl(remote.to_string()));
        self.check("remote", format!("fake remote {remote}"))?;
        self.remotes.get(remote).cloned().ok_or_else(|| {
            fake_failure(
                format!("fake remote {remote}"),
                format!("no such remote '{remote}'"),
            )
        })
    }

    async fn stage_all(&self, exclude: &[String]) -> VcsResult<()> {
        self.record(VcsCall::StageAll {
            exclude: exclude.to_vec(),
        });
        self.check("stage_all", "fake add -A".to_string())?;
        let mut state = self.state.lock().unwrap();
        let changed: Vec<String> = state
            .changed
            .iter()
            .filter(|p| !exclude.contains(*p))
            .cloned()
            .collect();
        state.staged.extend(changed);
        Ok(())
    }

    async fn force_stage(&self, path: &str) -> VcsResult<()> {
        self.record(VcsCall::ForceStage(path.to_string()));
        if self.failing_paths.contains(path) {
            return Err(fake_failure(
                format!("fake add -f {path}"),
                format!("cannot stage {path}"),
            ));
        }
        self.state.lock().unwrap().staged.push(path.to_string());
        Ok(())
    }

    async fn commit(&self, message: &str) -> VcsResult<CommitOutcome> {
        self.record(VcsCall::Commit(message.to_string()));
        self.check("commit", "fake commit".to_string())?;
        let mut state = self.state.lock().unwrap();
        if state.staged.is_empty() {
            return Ok(CommitOutcome::NothingToCommit);
        }
        let summary = format!("{} file(s) changed", state.staged.len());
        state.staged.clear();
        state.changed.clear();
        state.commits.push(message.to_string());
        Ok(CommitOutcome::Created { summary })
    }

    async fn push(&self, remote: &str, branch: &str) -> VcsResult<()> {
        self.record(VcsCall::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        self.check("push", format!("fake push {remote} {branch}"))?;
        self.state
            .lock()
            .unwrap()
            .pushed
            .push((remote.to_string(), branch.to_string()));
        Ok(())
    }
}
