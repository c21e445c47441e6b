//! Code distribution to fleet hosts.

use crate::session::{RemoteSession, SessionError};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Directory trees never shipped to the fleet.
pub const SYNC_EXCLUDES: &[&str] = &[".git", "__pycache__", "outputs"];

/// How code reaches the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionMode {
    /// Mirror the local working tree to each host.
    Sync,
    /// Ship through a central repository. Not implemented.
    PushPull,
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::PushPull => write!(f, "push_pull"),
        }
    }
}

/// Errors from code distribution.
#[derive(Debug, Error)]
pub enum DistributeError {
    /// The requested mode has no implementation.
    #[error("Distribution mode '{0}' is not supported")]
    Unsupported(DistributionMode),

    /// The underlying transfer failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Ship the working tree at `local_root` into `remote_dir` on the
/// session's host.
///
/// Repeated distribution is a delta transfer; unchanged trees ship
/// nothing. The unsupported mode fails before any session call.
pub async fn distribute(
    mode: DistributionMode,
    session: &dyn RemoteSession,
    local_root: &Path,
    remote_dir: &str,
) -> Result<(), DistributeError> {
    match mode {
        DistributionMode::Sync => {
            session
                .sync_tree(local_root, remote_dir, SYNC_EXCLUDES)
                .await?;
            Ok(())
        }
        DistributionMode::PushPull => Err(DistributeError::Unsupported(mode)),
    }
}
