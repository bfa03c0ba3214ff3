//! Render types

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio::time::Instant;

use crate::error::AppError;
use crate::ingest::PartSet;

/// Everything one render needs
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Host path of the request workspace
    pub workspace_dir: PathBuf,
    pub html: String,
    pub css: String,
    pub attachments: Vec<String>,
    /// The subprocess is killed once this passes
    pub deadline: Instant,
}

impl RenderRequest {
    pub fn new(workspace_dir: PathBuf, parts: PartSet, timeout: Duration) -> Self {
        Self {
            workspace_dir,
            html: parts.html,
            css: parts.css,
            attachments: parts.attachments,
            deadline: Instant::now() + timeout,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("renderer exceeded its deadline")]
    Timeout,

    #[error("failed to stream renderer output: {0}")]
    Output(#[source] std::io::Error),

    #[error("failed to wait for renderer: {0}")]
    Wait(#[source] std::io::Error),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::internal("PDF generation failed.").with_cause(err)
    }
}

/// Turns a populated workspace into PDF bytes written to `output`
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(
        &self,
        request: &RenderRequest,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), RenderError>;
}
