//! Ingestion types

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use thiserror::Error;

use super::workspace::WorkspaceError;
use crate::error::AppError;

pub const MISSING_HTML_MESSAGE: &str = "No html file provided.";

/// Role of a multipart part, decided by its field name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Html,
    Css,
    Attachment,
    /// Saved for relative references from the HTML, not passed to the renderer
    Asset,
}

impl PartKind {
    pub fn classify(field_name: &str) -> Self {
        match field_name {
            "html" => PartKind::Html,
            "css" => PartKind::Css,
            name if name.starts_with("attachment.") || name.starts_with("file.") => {
                PartKind::Attachment
            }
            _ => PartKind::Asset,
        }
    }
}

/// File names the renderer needs, all relative to the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSet {
    pub html: String,
    /// Uploaded stylesheet, or the sandbox default stylesheet path
    pub css: String,
    /// In stream order
    pub attachments: Vec<String>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no html part")]
    MissingHtml,

    #[error("part {0:?} has no file name")]
    MissingFileName(String),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("malformed multipart body: {0}")]
    Malformed(#[source] MultipartError),

    #[error("request body exceeds limit: {0}")]
    TooLarge(#[source] MultipartError),

    #[error("failed to write part {name:?}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<MultipartError> for IngestError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            IngestError::TooLarge(err)
        } else {
            IngestError::Malformed(err)
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MissingHtml => AppError::bad_request(MISSING_HTML_MESSAGE),
            IngestError::MissingFileName(ref field) => {
                AppError::bad_request(format!("Part {:?} has no file name.", field)).with_cause(err)
            }
            IngestError::Workspace(WorkspaceError::InvalidFileName(_)) => {
                AppError::bad_request("Invalid file name.").with_cause(err)
            }
            IngestError::Malformed(_) => {
                AppError::bad_request("Malformed multipart body.").with_cause(err)
            }
            IngestError::TooLarge(_) => {
                AppError::request_too_large("Request body too large.").with_cause(err)
            }
            IngestError::Workspace(_) | IngestError::Write { .. } => {
                AppError::internal("Failed to process request.").with_cause(err)
            }
        }
    }
}
