//! Working-tree revision status.

use serde::{Deserialize, Serialize};

/// Revision status of the local working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionStatus {
    /// Commit id of HEAD.
    pub commit: String,

    /// Uncommitted or untracked changes present.
    pub dirty: bool,
}

impl RevisionStatus {
    /// Create a new RevisionStatus.
    pub fn new(commit: impl Into<String>, dirty: bool) -> Self {
        Self {
            commit: commit.into(),
            dirty,
        }
    }
}
