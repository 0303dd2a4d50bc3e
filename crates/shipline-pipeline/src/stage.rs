//! Pipeline stages and run states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A pipeline stage that can abort a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Required files exist on disk.
    Verify,

    /// Working tree, branch and remote are queried and the remote checked.
    Inspect,

    /// Ordinary and forced files are staged.
    Stage,

    /// The staged index is committed.
    Commit,

    /// The branch is pushed to the remote.
    Publish,
}

impl Stage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Verify => "verify",
            Stage::Inspect => "inspect",
            Stage::Stage => "stage",
            Stage::Commit => "commit",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a run currently is.
///
/// `Start → Verifying → Inspecting → Staging → Committing → Publishing →
/// Reporting → Succeeded`. Any fatal error jumps to `Reporting` and ends in
/// `Aborted`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Start,
    Verifying,
    Inspecting,
    Staging,
    Committing,
    Publishing,
    Reporting,
    Succeeded,
    Aborted,
}

impl PipelineState {
    /// The stage executed while in this state, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Verifying => Some(Stage::Verify),
            PipelineState::Inspecting => Some(Stage::Inspect),
            PipelineState::Staging => Some(Stage::Stage),
            PipelineState::Committing => Some(Stage::Commit),
            PipelineState::Publishing => Some(Stage::Publish),
            _ => None,
        }
    }
}
