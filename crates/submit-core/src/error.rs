//! Core domain errors.

use thiserror::Error;

/// Errors raised while assembling the run configuration and host set.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No host in the inventory carries the master sentinel name.
    #[error("No master host named '{0}' in inventory")]
    MasterNotFound(String),

    /// A configuration key required by the requested operation is absent.
    #[error("Missing configuration key: {0}")]
    MissingKey(&'static str),

    /// A configuration or inventory file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML of the expected shape.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}
