//! Remote sessions over the OpenSSH client tools.
//!
//! Inventory hosts are OpenSSH config aliases, so every invocation carries
//! the client config that defines them. Commands run non-interactively:
//! BatchMode forbids password prompts.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use submit_core::RemoteOutput;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Exit code OpenSSH reserves for its own connection failures.
const SSH_TRANSPORT_EXIT: i32 = 255;

/// Errors from the remote transport.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The connection itself failed (spawn, auth, network).
    #[error("Transport failure on '{host}': {detail}")]
    Transport { host: String, detail: String },

    /// A file upload failed.
    #[error("Copy to '{host}' failed: {detail}")]
    Copy { host: String, detail: String },

    /// Tree synchronization failed.
    #[error("Sync to '{host}' failed: {detail}")]
    Sync { host: String, detail: String },
}

/// One logical connection to a host.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// The host this session talks to.
    fn host(&self) -> &str;

    /// Run a shell command on the host, capturing its output.
    ///
    /// A non-zero remote exit is a completed execution and comes back as
    /// data; `Err` means the transport failed.
    async fn run(&self, command: &str) -> Result<RemoteOutput, SessionError>;

    /// Copy a local file to a path on the host.
    async fn copy_to(&self, local: &Path, remote: &str) -> Result<(), SessionError>;

    /// Mirror the tree under `local_root` into `remote_dir` on the host.
    async fn sync_tree(
        &self,
        local_root: &Path,
        remote_dir: &str,
        excludes: &[&str],
    ) -> Result<(), SessionError>;
}

/// Produces sessions for inventory hosts.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a session to `host`.
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteSession>, SessionError>;
}

/// Client options applied to every ssh, scp, and rsync invocation.
#[derive(Debug, Clone)]
pub struct SshOptions {
    /// OpenSSH client config resolving the inventory aliases, if any.
    pub config_file: Option<PathBuf>,

    /// Seconds before a connection attempt is abandoned.
    pub connect_timeout_secs: u64,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            config_file: None,
            connect_timeout_secs: 10,
        }
    }
}

/// Session backed by the installed OpenSSH client tools.
pub struct SshSession {
    host: String,
    options: SshOptions,
}

impl SshSession {
    /// Create a session for `host` with the given client options.
    pub fn new(host: impl Into<String>, options: SshOptions) -> Self {
        Self {
            host: host.into(),
            options,
        }
    }

    /// Options shared by ssh and scp invocations.
    fn client_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.options.connect_timeout_secs),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
        ];
        if let Some(ref config) = self.options.config_file {
            args.push("-F".to_string());
            args.push(config.display().to_string());
        }
        args
    }

    /// The ssh command rsync tunnels through, as a single string.
    fn rsync_transport(&self) -> String {
        let mut transport = String::from("ssh");
        for arg in self.client_args() {
            transport.push(' ');
            transport.push_str(&arg);
        }
        transport
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&self, command: &str) -> Result<RemoteOutput, SessionError> {
        debug!(host = %self.host, command, "Running remote command");
        let output = Command::new("ssh")
            .args(self.client_args())
            .arg(&self.host)
            .arg(command)
            .output()
            .await
            .map_err(|e| SessionError::Transport {
                host: self.host.clone(),
                detail: e.to_string(),
            })?;

        // A signal-killed client counts as a transport failure.
        let exit_code = output.status.code().unwrap_or(SSH_TRANSPORT_EXIT);
        if exit_code == SSH_TRANSPORT_EXIT {
            return Err(SessionError::Transport {
                host: self.host.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(RemoteOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn copy_to(&self, local: &Path, remote: &str) -> Result<(), SessionError> {
        debug!(host = %self.host, local = %local.display(), remote, "Copying file");
        let output = Command::new("scp")
            .args(self.client_args())
            .arg(local)
            .arg(format!("{}:{}", self.host, remote))
            .output()
            .await
            .map_err(|e| SessionError::Copy {
                host: self.host.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(SessionError::Copy {
                host: self.host.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn sync_tree(
        &self,
        local_root: &Path,
        remote_dir: &str,
        excludes: &[&str],
    ) -> Result<(), SessionError> {
        let args = build_rsync_args(
            &self.host,
            &self.rsync_transport(),
            local_root,
            remote_dir,
            excludes,
        );
        debug!(host = %self.host, ?args, "Syncing tree");
        let output = Command::new("rsync")
            .args(&args)
            .output()
            .await
            .map_err(|e| SessionError::Sync {
                host: self.host.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(SessionError::Sync {
                host: self.host.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Factory producing [`SshSession`]s with shared client options.
#[derive(Debug, Clone, Default)]
pub struct SshSessionFactory {
    options: SshOptions,
}

impl SshSessionFactory {
    /// Create a factory applying `options` to every session.
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl SessionFactory for SshSessionFactory {
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteSession>, SessionError> {
        Ok(Box::new(SshSession::new(host, self.options.clone())))
    }
}

/// Build the rsync argument vector for mirroring `local_root` into
/// `remote_dir` on `host`.
fn build_rsync_args(
    host: &str,
    transport: &str,
    local_root: &Path,
    remote_dir: &str,
    excludes: &[&str],
) -> Vec<String> {
    // Archive, compress, keep partial transfers for resume.
    let mut args = vec!["-az".to_string(), "--partial".to_string()];

    args.push("-e".to_string());
    args.push(transport.to_string());

    for pattern in excludes {
        args.push("--exclude".to_string());
        args.push((*pattern).to_string());
    }

    // Trailing slash ships the directory's contents, not the directory.
    args.push(ensure_trailing_slash(&local_root.display().to_string()));
    args.push(format!("{host}:{remote_dir}"));

    args
}

/// Ensure a path ends with `/` (rsync convention for directory contents).
fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
