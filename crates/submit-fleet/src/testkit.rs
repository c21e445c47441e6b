//! Scripted session doubles shared by the crate's tests.
//!
//! A [`ScriptedFactory`] hands out sessions that record every call into a
//! shared chronological log and replay per-host scripted outcomes. A
//! semaphore gate lets tests prove that hosts were genuinely in flight at
//! the same time: a gated `run` only finishes once other hosts' `run`
//! calls have opened the gate, so any sequential fan-out deadlocks
//! instead of passing.

use crate::session::{RemoteSession, SessionError, SessionFactory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use submit_core::RemoteOutput;
use tokio::sync::Semaphore;

/// Scripted behavior for one host. Defaults to succeeding everywhere with
/// exit code zero.
#[derive(Debug, Clone, Default)]
pub struct HostScript {
    /// Fail the connect step.
    pub fail_connect: bool,
    /// Fail the sync step.
    pub fail_sync: bool,
    /// Fail every copy step.
    pub fail_copy: bool,
    /// Fail the run step at the transport level.
    pub fail_run: bool,
    /// Exit code returned by `run`.
    pub run_exit_code: i32,
    /// Stdout returned by `run`.
    pub run_stdout: String,
    /// `run` finishes only after acquiring this many gate permits.
    pub await_gate: u32,
    /// `run` opens the gate for this many waiters before returning.
    pub open_gate: usize,
}

/// Chronological record of session calls across all hosts.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Index of the first entry containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.contains(needle))
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }
}

/// Factory producing scripted sessions.
pub struct ScriptedFactory {
    scripts: HashMap<String, HostScript>,
    log: CallLog,
    gate: Arc<Semaphore>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            log: CallLog::default(),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    /// Builder method to script one host's behavior.
    pub fn with_script(mut self, host: &str, script: HostScript) -> Self {
        self.scripts.insert(host.to_string(), script);
        self
    }

    /// Handle on the shared call log.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteSession>, SessionError> {
        let script = self.scripts.get(host).cloned().unwrap_or_default();
        self.log.record(format!("connect {host}"));

        if script.fail_connect {
            return Err(SessionError::Transport {
                host: host.to_string(),
                detail: "scripted connect failure".to_string(),
            });
        }

        Ok(Box::new(ScriptedSession {
            host: host.to_string(),
            script,
            log: self.log.clone(),
            gate: Arc::clone(&self.gate),
        }))
    }
}

/// Session replaying one host's script.
pub struct ScriptedSession {
    host: String,
    script: HostScript,
    log: CallLog,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&self, command: &str) -> Result<RemoteOutput, SessionError> {
        self.log.record(format!("run {}: {command}", self.host));

        if self.script.open_gate > 0 {
            self.gate.add_permits(self.script.open_gate);
        }
        if self.script.await_gate > 0 {
            let permits = self.gate.acquire_many(self.script.await_gate).await.unwrap();
            permits.forget();
        }

        if self.script.fail_run {
            return Err(SessionError::Transport {
                host: self.host.clone(),
                detail: "scripted run failure".to_string(),
            });
        }

        self.log.record(format!("finish {}", self.host));
        Ok(RemoteOutput {
            exit_code: self.script.run_exit_code,
            stdout: self.script.run_stdout.clone(),
            stderr: String::new(),
        })
    }

    async fn copy_to(&self, local: &Path, remote: &str) -> Result<(), SessionError> {
        self.log
            .record(format!("copy {}: {} -> {remote}", self.host, local.display()));

        if self.script.fail_copy {
            return Err(SessionError::Copy {
                host: self.host.clone(),
                detail: "scripted copy failure".to_string(),
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
        self.log.record(format!(
            "sync {}: {} -> {remote_dir} excluding [{}]",
            self.host,
            local_root.display(),
            excludes.join(", ")
        ));

        if self.script.fail_sync {
            return Err(SessionError::Sync {
                host: self.host.clone(),
                detail: "scripted sync failure".to_string(),
            });
        }
        Ok(())
    }
}
