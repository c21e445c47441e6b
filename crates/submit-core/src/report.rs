//! Dispatch outcome types.

use crate::ids::DispatchId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Captured output of one remote command.
///
/// A non-zero exit code is a completed execution, not a transport failure,
/// and is carried here as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOutput {
    /// Remote process exit code.
    pub exit_code: i32,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,
}

impl RemoteOutput {
    /// True when the remote process exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Status of one host's execution within a dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostStatus {
    /// Execution not yet started.
    #[default]
    Pending,
    /// Connect/distribute/run sequence in flight.
    Running,
    /// Remote command ran to completion (any exit code).
    Completed,
    /// Transport or distribution failed before or during the run.
    Failed,
}

impl HostStatus {
    /// Returns true if the execution reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Outcome of one host's execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostReport {
    /// Inventory name of the host.
    pub host: String,

    /// Current execution status.
    pub status: HostStatus,

    /// When the connect/distribute/run sequence started.
    pub started_at: Option<DateTime<Utc>>,

    /// When the sequence reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,

    /// Captured output, present once the remote command completed.
    pub output: Option<RemoteOutput>,

    /// Error message if the sequence failed.
    pub error_message: Option<String>,
}

impl HostReport {
    /// Create a new pending HostReport.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            status: HostStatus::Pending,
            started_at: None,
            finished_at: None,
            output: None,
            error_message: None,
        }
    }

    /// Mark the execution as started.
    pub fn start(&mut self) {
        self.status = HostStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark the execution as completed with captured output.
    pub fn complete(&mut self, output: RemoteOutput) {
        self.status = HostStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.output = Some(output);
    }

    /// Mark the execution as failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = HostStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error_message = Some(error.into());
    }

    /// True when the remote command completed with exit code zero.
    pub fn succeeded(&self) -> bool {
        self.status == HostStatus::Completed
            && self.output.as_ref().is_some_and(RemoteOutput::success)
    }
}

/// Outcome of one whole dispatch: the master plus every worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetReport {
    /// Identifier correlating this dispatch's log lines.
    pub dispatch_id: DispatchId,

    /// The master's outcome. Its exit code is the dispatch's result.
    pub master: HostReport,

    /// Worker outcomes, in start order.
    pub workers: Vec<HostReport>,
}

impl FleetReport {
    /// The master's remote exit code, once its command completed.
    pub fn master_exit_code(&self) -> Option<i32> {
        self.master.output.as_ref().map(|o| o.exit_code)
    }

    /// Workers whose execution failed or exited non-zero.
    pub fn failed_workers(&self) -> Vec<&HostReport> {
        self.workers.iter().filter(|w| !w.succeeded()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(exit_code: i32) -> RemoteOutput {
        RemoteOutput {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_report_lifecycle() {
        let mut report = HostReport::new("worker1");
        assert_eq!(report.status, HostStatus::Pending);
        assert!(!report.status.is_terminal());

        report.start();
        assert_eq!(report.status, HostStatus::Running);
        assert!(report.started_at.is_some());

        report.complete(output(0));
        assert!(report.status.is_terminal());
        assert!(report.finished_at.is_some());
        assert!(report.succeeded());
    }

    #[test]
    fn test_nonzero_exit_is_completed_but_not_succeeded() {
        let mut report = HostReport::new("worker1");
        report.start();
        report.complete(output(3));

        assert_eq!(report.status, HostStatus::Completed);
        assert!(!report.succeeded());
    }

    #[test]
    fn test_failed_report_carries_message() {
        let mut report = HostReport::new("worker2");
        report.start();
        report.fail("connection refused");

        assert_eq!(report.status, HostStatus::Failed);
        assert_eq!(report.error_message.as_deref(), Some("connection refused"));
        assert!(!report.succeeded());
    }

    #[test]
    fn test_fleet_report_failed_workers() {
        let mut ok = HostReport::new("worker1");
        ok.start();
        ok.complete(output(0));

        let mut nonzero = HostReport::new("worker2");
        nonzero.start();
        nonzero.complete(output(1));

        let mut broken = HostReport::new("worker3");
        broken.start();
        broken.fail("no route to host");

        let mut master = HostReport::new("worker0");
        master.start();
        master.complete(output(0));

        let report = FleetReport {
            dispatch_id: DispatchId::generate(),
            master,
            workers: vec![ok, nonzero, broken],
        };

        let failed: Vec<&str> = report
            .failed_workers()
            .iter()
            .map(|w| w.host.as_str())
            .collect();
        assert_eq!(failed, vec!["worker2", "worker3"]);
        assert_eq!(report.master_exit_code(), Some(0));
    }
}
