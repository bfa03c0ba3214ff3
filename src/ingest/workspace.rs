//! Per-request workspace
//!
//! A private temporary directory that only accepts plain file names, so no
//! write can land outside of it. The directory is removed when the
//! `Workspace` is dropped, whatever path the request took.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{File, OpenOptions};

const WORKSPACE_PREFIX: &str = "pdf-service-";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace: {0}")]
    Create(#[source] io::Error),

    #[error("file name {0:?} would escape the workspace")]
    InvalidFileName(String),

    #[error("failed to open {name:?} in workspace: {source}")]
    Open {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    /// Create a fresh workspace below `parent`, or the system temp dir.
    pub fn create(parent: Option<&Path>) -> Result<Self, WorkspaceError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(WorkspaceError::Create)?;

        tracing::debug!(workspace = %dir.path().display(), "Workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Resolve a file name to a path directly inside the workspace.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, WorkspaceError> {
        if !is_plain_file_name(file_name) {
            return Err(WorkspaceError::InvalidFileName(file_name.to_string()));
        }
        Ok(self.dir.path().join(file_name))
    }

    /// Create (or truncate) a file inside the workspace for writing.
    pub async fn create_file(&self, file_name: &str) -> Result<File, WorkspaceError> {
        let path = self.resolve(file_name)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        options.open(&path).await.map_err(|source| WorkspaceError::Open {
            name: file_name.to_string(),
            source,
        })
    }

    /// Remove the workspace now and report failures instead of ignoring them.
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(workspace = %path.display(), "Workspace removed");
        Ok(())
    }
}

/// A single, normal path component
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
