//! Host roles and fleet host-set resolution.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inventory name that marks the master host.
pub const MASTER_SENTINEL: &str = "worker0";

/// Name prefix selecting fleet members out of the inventory.
const WORKER_PREFIX: &str = "worker";

/// Role of a host within the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostRole {
    /// Coordinating host. Runs synchronously and determines the exit code.
    Master,
    /// Fleet member. Runs in the background while the master is observed.
    Worker,
}

/// A named host with its fleet role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    /// Inventory name (an OpenSSH config alias).
    pub name: String,

    /// Role within the fleet.
    pub role: HostRole,
}

impl Host {
    /// Create a master host.
    pub fn master(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: HostRole::Master,
        }
    }

    /// Create a worker host.
    pub fn worker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: HostRole::Worker,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The resolved fleet: exactly one master plus workers in inventory order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSet {
    /// The coordinating host.
    pub master: Host,

    /// Fleet members, preserving inventory order.
    pub workers: Vec<Host>,
}

impl HostSet {
    /// Total number of hosts that will receive the command.
    pub fn len(&self) -> usize {
        1 + self.workers.len()
    }

    /// A host set always contains at least the master.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Partition inventory names into one master and the workers.
///
/// The sentinel name is the master. Any other name starting with `worker`
/// joins the fleet, keeping inventory order. Names outside the `worker`
/// namespace (login nodes, storage hosts) are ignored.
pub fn resolve_hosts<S: AsRef<str>>(names: &[S], sentinel: &str) -> Result<HostSet, ConfigError> {
    let mut master = None;
    let mut workers = Vec::new();

    for name in names {
        let name = name.as_ref();
        if name == sentinel {
            master = Some(Host::master(name));
        } else if name.starts_with(WORKER_PREFIX) {
            workers.push(Host::worker(name));
        }
    }

    match master {
        Some(master) => Ok(HostSet { master, workers }),
        None => Err(ConfigError::MasterNotFound(sentinel.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_master_and_workers_in_order() {
        let names = ["worker0", "worker1", "worker2"];
        let set = resolve_hosts(&names, MASTER_SENTINEL).unwrap();

        assert_eq!(set.master, Host::master("worker0"));
        assert_eq!(
            set.workers,
            vec![Host::worker("worker1"), Host::worker("worker2")]
        );
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_resolve_preserves_inventory_order() {
        let names = ["worker3", "worker0", "worker1"];
        let set = resolve_hosts(&names, MASTER_SENTINEL).unwrap();

        let workers: Vec<&str> = set.workers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(workers, vec!["worker3", "worker1"]);
    }

    #[test]
    fn test_resolve_ignores_non_worker_names() {
        let names = ["worker0", "worker1", "worker2", "editnode"];
        let set = resolve_hosts(&names, MASTER_SENTINEL).unwrap();

        assert_eq!(set.master.name, "worker0");
        assert_eq!(set.workers.len(), 2);
        assert!(set.workers.iter().all(|h| h.name != "editnode"));
    }

    #[test]
    fn test_resolve_missing_sentinel_is_an_error() {
        let names = ["worker1", "worker2", "editnode"];
        let err = resolve_hosts(&names, MASTER_SENTINEL).unwrap_err();
        assert!(matches!(err, ConfigError::MasterNotFound(_)));
    }

    #[test]
    fn test_resolve_master_only_fleet() {
        let names = ["worker0", "editnode"];
        let set = resolve_hosts(&names, MASTER_SENTINEL).unwrap();

        assert_eq!(set.master.name, "worker0");
        assert!(set.workers.is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_resolve_custom_sentinel() {
        let names = ["workerX", "worker0", "worker1"];
        let set = resolve_hosts(&names, "workerX").unwrap();

        assert_eq!(set.master.name, "workerX");
        let workers: Vec<&str> = set.workers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(workers, vec!["worker0", "worker1"]);
    }

    #[test]
    fn test_host_display() {
        assert_eq!(format!("{}", Host::worker("worker7")), "worker7");
    }
}
