//! Run configuration loaded from the experiment's YAML variables file.
//!
//! The configuration is parsed exactly once at process start and handed to
//! collaborators by reference. Nothing else reads the file.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// The `python:` section of the variables file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct PythonSection {
    /// Root of the virtualenv the remote command runs under.
    virtualenv: String,
}

/// The `experiment.results:` section of the variables file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct ResultsSection {
    dir: Option<String>,
}

/// The `experiment:` section of the variables file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct ExperimentSection {
    #[serde(default)]
    results: ResultsSection,
}

/// Experiment run configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    python: PythonSection,

    #[serde(default)]
    experiment: ExperimentSection,
}

impl RunConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Python interpreter inside the configured virtualenv.
    pub fn interpreter(&self) -> String {
        format!("{}/bin/python", self.python.virtualenv)
    }

    /// Pip executable inside the configured virtualenv.
    pub fn package_manager(&self) -> String {
        format!("{}/bin/pip", self.python.virtualenv)
    }

    /// Remote directory that receives results and the runbook.
    ///
    /// Only runbook publication needs this key, so its absence is reported
    /// here rather than at parse time.
    pub fn results_dir(&self) -> Result<&str, ConfigError> {
        self.experiment
            .results
            .dir
            .as_deref()
            .ok_or(ConfigError::MissingKey("experiment.results.dir"))
    }
}
