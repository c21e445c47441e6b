//! Fleet dispatch orchestration.
//!
//! One dispatch runs the same command on every fleet host. Workers are
//! started in inventory order without blocking the coordinator, the master
//! runs synchronously once every worker has been started, and workers are
//! joined in start order afterwards. Joining is exhaustive: a worker or
//! master failure never leaves another worker unobserved. There is no
//! cancellation: a launched remote process runs to completion or until its
//! transport drops.

use crate::distribute::{distribute, DistributeError, DistributionMode};
use crate::session::{SessionError, SessionFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use submit_core::{
    remote_command, CommandLine, DispatchId, FleetReport, HostReport, HostSet, RemoteOutput,
    RunConfig, REMOTE_WORK_DIR,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Errors that abort a dispatch.
///
/// Only the master's own failure aborts. Worker failures are recorded in
/// the report and logged.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The master could not be reached.
    #[error("Failed to connect to master '{host}': {source}")]
    MasterConnect {
        host: String,
        #[source]
        source: SessionError,
    },

    /// Code never reached the master.
    #[error("Distribution to master '{host}' failed: {source}")]
    MasterDistribute {
        host: String,
        #[source]
        source: DistributeError,
    },

    /// The master's command could not be launched or observed.
    #[error("Remote launch on master '{host}' failed: {source}")]
    MasterLaunch {
        host: String,
        #[source]
        source: SessionError,
    },
}

/// Failure of one host's connect/distribute/run sequence.
#[derive(Debug, Error)]
enum HostFailure {
    #[error("connect failed: {0}")]
    Connect(#[source] SessionError),

    #[error("distribution failed: {0}")]
    Distribute(#[source] DistributeError),

    #[error("launch failed: {0}")]
    Launch(#[source] SessionError),
}

impl HostFailure {
    fn into_master_error(self, host: &str) -> DispatchError {
        let host = host.to_owned();
        match self {
            Self::Connect(source) => DispatchError::MasterConnect { host, source },
            Self::Distribute(source) => DispatchError::MasterDistribute { host, source },
            Self::Launch(source) => DispatchError::MasterLaunch { host, source },
        }
    }
}

/// One worker's in-flight execution, joined exactly once after the master
/// completes.
struct DispatchHandle {
    report: HostReport,
    task: JoinHandle<Result<RemoteOutput, HostFailure>>,
}

/// Dispatches one command across the fleet.
pub struct FleetDispatcher {
    factory: Arc<dyn SessionFactory>,
    local_root: PathBuf,
    remote_dir: String,
}

impl FleetDispatcher {
    /// Create a dispatcher shipping the current directory into the default
    /// remote work dir.
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            local_root: PathBuf::from("."),
            remote_dir: REMOTE_WORK_DIR.to_string(),
        }
    }

    /// Builder method to ship a different local tree (useful for testing).
    pub fn with_local_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root = root.into();
        self
    }

    /// Run `line` on every fleet host.
    ///
    /// The returned report carries the master's captured output and one
    /// entry per worker in start order. Non-zero remote exits are data in
    /// the report, not errors. A master-side connect, distribution, or
    /// transport failure is returned as an error once every worker has
    /// been joined.
    pub async fn dispatch_all(
        &self,
        hosts: &HostSet,
        line: &CommandLine,
        mode: DistributionMode,
        config: &RunConfig,
    ) -> Result<FleetReport, DispatchError> {
        let dispatch_id = DispatchId::generate();
        let command = remote_command(&config.interpreter(), line);
        info!(
            dispatch_id = %dispatch_id,
            master = %hosts.master,
            workers = hosts.workers.len(),
            %mode,
            %command,
            "Dispatching to fleet"
        );

        let mut pending: Vec<DispatchHandle> = Vec::with_capacity(hosts.workers.len());

        for worker in &hosts.workers {
            let factory = Arc::clone(&self.factory);
            let host = worker.name.clone();
            let command = command.clone();
            let local_root = self.local_root.clone();
            let remote_dir = self.remote_dir.clone();

            let mut report = HostReport::new(&worker.name);
            report.start();
            info!(dispatch_id = %dispatch_id, host = %worker, "Starting worker");

            let task = tokio::spawn(async move {
                run_on_host(
                    factory.as_ref(),
                    &host,
                    &command,
                    mode,
                    &local_root,
                    &remote_dir,
                )
                .await
            });
            pending.push(DispatchHandle { report, task });
        }

        // The master runs only after every worker has been started.
        let mut master_report = HostReport::new(&hosts.master.name);
        master_report.start();
        info!(dispatch_id = %dispatch_id, host = %hosts.master, "Running master");
        let master_result = run_on_host(
            self.factory.as_ref(),
            &hosts.master.name,
            &command,
            mode,
            &self.local_root,
            &self.remote_dir,
        )
        .await;

        match &master_result {
            Ok(output) => {
                info!(
                    dispatch_id = %dispatch_id,
                    host = %hosts.master,
                    exit_code = output.exit_code,
                    "Master finished"
                );
                master_report.complete(output.clone());
            }
            Err(failure) => {
                error!(
                    dispatch_id = %dispatch_id,
                    host = %hosts.master,
                    error = %failure,
                    "Master failed"
                );
                master_report.fail(failure.to_string());
            }
        }

        // Join every worker in start order, even when the master failed.
        let mut workers = Vec::with_capacity(pending.len());
        for DispatchHandle { mut report, task } in pending {
            match task.await {
                Ok(Ok(output)) => {
                    if output.success() {
                        info!(dispatch_id = %dispatch_id, host = %report.host, "Worker finished");
                    } else {
                        warn!(
                            dispatch_id = %dispatch_id,
                            host = %report.host,
                            exit_code = output.exit_code,
                            "Worker exited non-zero"
                        );
                    }
                    report.complete(output);
                }
                Ok(Err(failure)) => {
                    warn!(
                        dispatch_id = %dispatch_id,
                        host = %report.host,
                        error = %failure,
                        "Worker failed"
                    );
                    report.fail(failure.to_string());
                }
                Err(join_error) => {
                    warn!(
                        dispatch_id = %dispatch_id,
                        host = %report.host,
                        error = %join_error,
                        "Worker task aborted"
                    );
                    report.fail(format!("task aborted: {join_error}"));
                }
            }
            workers.push(report);
        }

        match master_result {
            Ok(_) => Ok(FleetReport {
                dispatch_id,
                master: master_report,
                workers,
            }),
            Err(failure) => Err(failure.into_master_error(&hosts.master.name)),
        }
    }
}

/// Connect, distribute, and launch on one host.
async fn run_on_host(
    factory: &dyn SessionFactory,
    host: &str,
    command: &str,
    mode: DistributionMode,
    local_root: &Path,
    remote_dir: &str,
) -> Result<RemoteOutput, HostFailure> {
    let session = factory.connect(host).await.map_err(HostFailure::Connect)?;
    distribute(mode, session.as_ref(), local_root, remote_dir)
        .await
        .map_err(HostFailure::Distribute)?;
    session.run(command).await.map_err(HostFailure::Launch)
}
