//! submit - dispatch a command to the experiment fleet.
//!
//! The fleet comes from the experiment's ssh_config: the sentinel host is
//! the master, the remaining `worker*` hosts run in the background. The
//! process exit code mirrors the master's remote exit code; worker
//! failures are reported without changing it.

mod inventory;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use submit_core::{resolve_hosts, CommandLine, FleetReport, RunConfig, MASTER_SENTINEL};
use submit_fleet::{
    revision_status, DistributionMode, FleetDispatcher, RunbookPublisher, SessionFactory,
    SshOptions, SshSessionFactory,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Dispatch a command to every host in the experiment fleet
#[derive(Parser)]
#[command(name = "submit")]
#[command(about = "Dispatch a command to the experiment fleet", long_about = None)]
struct Cli {
    /// Ansible variable file for the experiment cluster
    #[arg(short, long, default_value = "./ansible/config/vars.yml")]
    config: PathBuf,

    /// How code reaches the fleet
    #[arg(short, long, value_enum, default_value_t = Mode::Sync)]
    mode: Mode,

    /// Publish a runbook to the results directory before dispatching
    #[arg(short = 'r', long)]
    with_runbook: bool,

    /// Accept a dirty working tree when publishing the runbook
    #[arg(long)]
    allow_dirty: bool,

    /// OpenSSH client config naming the fleet hosts
    #[arg(long, default_value = "./ssh_config")]
    ssh_config: PathBuf,

    /// Program to run on every host
    command: String,

    /// Parameters passed to the program verbatim
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    params: Vec<String>,
}

/// Code distribution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Mode {
    /// Mirror the local working tree to each host
    Sync,
    /// Ship through a central repository (not supported)
    PushPull,
}

impl From<Mode> for DistributionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sync => DistributionMode::Sync,
            Mode::PushPull => DistributionMode::PushPull,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("submit_cli=info".parse().unwrap())
                .add_directive("submit_fleet=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    // The runbook records the invocation exactly as typed.
    let invocation = std::env::args().collect::<Vec<_>>().join(" ");
    let cli = Cli::parse();

    match run(cli, &invocation).await {
        Ok(report) => {
            if let Some(output) = &report.master.output {
                print!("{}", output.stdout);
                eprint!("{}", output.stderr);
            }

            for worker in report.failed_workers() {
                match (&worker.output, &worker.error_message) {
                    (Some(output), _) => warn!(
                        host = %worker.host,
                        exit_code = output.exit_code,
                        "Worker exited non-zero"
                    ),
                    (_, Some(message)) => {
                        warn!(host = %worker.host, error = %message, "Worker failed")
                    }
                    _ => {}
                }
            }

            // The process mirrors the master's remote exit code.
            std::process::exit(report.master_exit_code().unwrap_or(1));
        }
        Err(e) => {
            error!(error = %e, "submit failed");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, invocation: &str) -> Result<FleetReport, Box<dyn std::error::Error>> {
    let config = RunConfig::load(&cli.config)?;
    let hostnames = inventory::read_hostnames(&cli.ssh_config)?;
    let hosts = resolve_hosts(&hostnames, MASTER_SENTINEL)?;
    info!(
        master = %hosts.master,
        workers = hosts.workers.len(),
        config = %cli.config.display(),
        "Resolved fleet"
    );

    let factory = Arc::new(SshSessionFactory::new(SshOptions {
        config_file: Some(cli.ssh_config.clone()),
        ..SshOptions::default()
    }));

    if cli.with_runbook {
        let results_dir = config.results_dir()?;
        let revision = revision_status(Path::new(".")).await?;
        let session = factory.connect(&hosts.master.name).await?;
        let publisher = RunbookPublisher::new().with_allow_dirty(cli.allow_dirty);
        publisher
            .publish(session.as_ref(), results_dir, &revision, invocation)
            .await?;
    }

    let line = CommandLine::new(&cli.command, cli.params);
    let dispatcher = FleetDispatcher::new(factory);
    let report = dispatcher
        .dispatch_all(&hosts, &line, cli.mode.into(), &config)
        .await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["submit", "train.py"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("./ansible/config/vars.yml"));
        assert_eq!(cli.ssh_config, PathBuf::from("./ssh_config"));
        assert_eq!(cli.mode, Mode::Sync);
        assert!(!cli.with_runbook);
        assert!(!cli.allow_dirty);
        assert_eq!(cli.command, "train.py");
        assert!(cli.params.is_empty());
    }

    #[test]
    fn test_full_invocation() {
        let cli = Cli::try_parse_from([
            "submit", "-c", "vars.yml", "-m", "push_pull", "-r", "train.py", "--epochs", "5",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("vars.yml"));
        assert_eq!(cli.mode, Mode::PushPull);
        assert!(cli.with_runbook);
        assert_eq!(cli.command, "train.py");
        assert_eq!(cli.params, vec!["--epochs", "5"]);
    }

    #[test]
    fn test_unknown_mode_is_rejected_at_parse() {
        assert!(Cli::try_parse_from(["submit", "-m", "broadcast", "train.py"]).is_err());
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["submit"]).is_err());
    }

    #[test]
    fn test_mode_maps_to_distribution_mode() {
        assert_eq!(DistributionMode::from(Mode::Sync), DistributionMode::Sync);
        assert_eq!(
            DistributionMode::from(Mode::PushPull),
            DistributionMode::PushPull
        );
    }
}
