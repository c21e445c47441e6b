//! Runbook publication to the master host.
//!
//! The runbook is rendered locally, staged next to the working tree,
//! uploaded together with the setup document, and the staged copy is
//! removed again whether or not the upload succeeded.

use crate::session::{RemoteSession, SessionError};
use std::path::{Path, PathBuf};
use submit_core::{runbook, RevisionStatus};
use thiserror::Error;
use tracing::{info, warn};

/// Local staging name of the rendered runbook, also its remote name.
const RUNBOOK_PATH: &str = "runbook.md";

/// Setup document expected at the experiment root.
const SETUP_PATH: &str = "README.md";

/// Errors from runbook publication.
#[derive(Debug, Error)]
pub enum RunbookError {
    /// The working tree has uncommitted changes and dirty trees are not
    /// allowed.
    #[error("Git repository is not clean")]
    DirtyTree,

    /// Staging the local runbook failed.
    #[error("Failed to stage runbook at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Creating the remote results directory failed.
    #[error("Failed to create remote results dir: {0}")]
    RemoteSetup(String),

    /// An upload failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Publishes the runbook and setup document to the master host.
pub struct RunbookPublisher {
    /// Local setup document uploaded alongside the runbook.
    setup_document: PathBuf,

    /// Where the rendered runbook is staged before upload.
    staging_path: PathBuf,

    /// Accept a dirty working tree.
    allow_dirty: bool,
}

impl Default for RunbookPublisher {
    fn default() -> Self {
        Self {
            setup_document: PathBuf::from(SETUP_PATH),
            staging_path: PathBuf::from(RUNBOOK_PATH),
            allow_dirty: false,
        }
    }
}

impl RunbookPublisher {
    /// Create a publisher with the default staging and setup paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to accept a dirty working tree.
    pub fn with_allow_dirty(mut self, allow_dirty: bool) -> Self {
        self.allow_dirty = allow_dirty;
        self
    }

    /// Builder method to stage the runbook elsewhere.
    pub fn with_staging_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.staging_path = path.into();
        self
    }

    /// Builder method to upload a different setup document.
    pub fn with_setup_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.setup_document = path.into();
        self
    }

    /// Render and upload the runbook for one dispatch.
    ///
    /// The dirty-tree check runs before anything is written or sent. The
    /// staged local runbook is removed on success and failure alike.
    pub async fn publish(
        &self,
        session: &dyn RemoteSession,
        results_dir: &str,
        revision: &RevisionStatus,
        invocation: &str,
    ) -> Result<(), RunbookError> {
        if revision.dirty && !self.allow_dirty {
            return Err(RunbookError::DirtyTree);
        }

        let setup_name = file_name_of(&self.setup_document, SETUP_PATH);
        let text = runbook::render(setup_name, &revision.commit, invocation);
        std::fs::write(&self.staging_path, text).map_err(|source| RunbookError::Io {
            path: self.staging_path.display().to_string(),
            source,
        })?;

        let result = self.upload(session, results_dir).await;

        if let Err(source) = std::fs::remove_file(&self.staging_path) {
            warn!(
                path = %self.staging_path.display(),
                error = %source,
                "Failed to remove staged runbook"
            );
        }

        if result.is_ok() {
            info!(host = session.host(), results_dir, "Runbook published");
        }
        result
    }

    async fn upload(
        &self,
        session: &dyn RemoteSession,
        results_dir: &str,
    ) -> Result<(), RunbookError> {
        let mkdir = session.run(&format!("mkdir {results_dir}")).await?;
        if !mkdir.success() {
            return Err(RunbookError::RemoteSetup(mkdir.stderr.trim().to_string()));
        }

        let setup_name = file_name_of(&self.setup_document, SETUP_PATH);
        session
            .copy_to(&self.setup_document, &format!("{results_dir}/{setup_name}"))
            .await?;

        let runbook_name = file_name_of(&self.staging_path, RUNBOOK_PATH);
        session
            .copy_to(&self.staging_path, &format!("{results_dir}/{runbook_name}"))
            .await?;

        Ok(())
    }
}

/// File name component of `path`, or `fallback` when it has none.
fn file_name_of<'a>(path: &'a Path, fallback: &'a str) -> &'a str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or(fallback)
}
