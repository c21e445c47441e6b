//! Fleet-side effects for submit.
//!
//! Everything that leaves the local process lives here: remote sessions
//! over the OpenSSH client tools, code distribution, runbook publication,
//! revision probing, and the dispatch orchestration itself. Pure domain
//! types live in `submit-core`.

pub mod dispatch;
pub mod distribute;
pub mod git;
pub mod runbook;
pub mod session;

#[cfg(test)]
pub(crate) mod testkit;

// Re-export commonly used types
pub use dispatch::{DispatchError, FleetDispatcher};
pub use distribute::{distribute, DistributeError, DistributionMode, SYNC_EXCLUDES};
pub use git::{revision_status, GitError};
pub use runbook::{RunbookError, RunbookPublisher};
pub use session::{
    RemoteSession, SessionError, SessionFactory, SshOptions, SshSession, SshSessionFactory,
};
