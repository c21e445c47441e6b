//! Working-tree revision probing via the git CLI.

use std::path::Path;
use submit_core::RevisionStatus;
use thiserror::Error;
use tokio::process::Command;

/// Errors from probing the working tree's revision.
#[derive(Debug, Error)]
pub enum GitError {
    /// git could not be spawned.
    #[error("Failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    /// git exited non-zero.
    #[error("git {command} failed: {detail}")]
    CommandFailed { command: String, detail: String },
}

/// Read the commit id and dirty flag of the working tree at `dir`.
pub async fn revision_status(dir: &Path) -> Result<RevisionStatus, GitError> {
    let commit = git_stdout(dir, &["rev-parse", "HEAD"]).await?;
    let porcelain = git_stdout(dir, &["status", "--porcelain"]).await?;
    Ok(interpret(&commit, &porcelain))
}

/// Interpret raw `rev-parse HEAD` and `status --porcelain` output.
fn interpret(commit: &str, porcelain: &str) -> RevisionStatus {
    RevisionStatus::new(commit.trim(), !porcelain.trim().is_empty())
}

async fn git_stdout(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await?;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: args.join(" "),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_tree() {
        let status = interpret("f00dbabe\n", "");
        assert_eq!(status.commit, "f00dbabe");
        assert!(!status.dirty);
    }

    #[test]
    fn test_whitespace_only_porcelain_is_clean() {
        let status = interpret("f00dbabe\n", "\n");
        assert!(!status.dirty);
    }

    #[test]
    fn test_modified_tree_is_dirty() {
        let status = interpret("f00dbabe\n", " M train.py\n?? notes.txt\n");
        assert!(status.dirty);
    }
}
