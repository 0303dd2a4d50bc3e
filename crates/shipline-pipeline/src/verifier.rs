//! Precondition gate: required files must exist before anything is staged.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

/// Which of the checked paths exist.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileCheckReport {
    present: BTreeSet<String>,
    missing: BTreeSet<String>,
    success: bool,
}

impl FileCheckReport {
    fn new(present: BTreeSet<String>, missing: BTreeSet<String>) -> Self {
        let success = missing.is_empty();
        Self {
            present,
            missing,
            success,
        }
    }

    pub fn present(&self) -> &BTreeSet<String> {
        &self.present
    }

    pub fn missing(&self) -> &BTreeSet<String> {
        &self.missing
    }

    pub fn success(&self) -> bool {
        self.success
    }
}

pub struct PreconditionVerifier;

impl PreconditionVerifier {
    /// Check each path under `root` for existence.
    ///
    /// Every path is checked, even after a miss. A path whose existence
    /// cannot be determined counts as missing.
    pub fn verify(root: &Path, paths: &[String]) -> FileCheckReport {
        let mut present = BTreeSet::new();
        let mut missing = BTreeSet::new();

        for path in paths {
            let exists = root.join(path).try_exists().unwrap_or_else(|e| {
                debug!(path = %path, error = %e, "existence check failed");
                false
            });
            if exists {
                present.insert(path.clone());
            } else {
                missing.insert(path.clone());
            }
        }

        FileCheckReport::new(present, missing)
    }
}
