//! Multipart ingestion
//!
//! Streams every part of the body into the workspace, then reports which
//! files the renderer should receive.

use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;

use super::types::{IngestError, PartKind, PartSet};
use super::workspace::Workspace;

/// Save all parts into `workspace` and classify them.
///
/// `default_stylesheet` is used when no `css` part is present.
pub async fn ingest_parts(
    multipart: &mut Multipart,
    workspace: &Workspace,
    default_stylesheet: &str,
) -> Result<PartSet, IngestError> {
    let mut html = None;
    let mut css = None;
    let mut attachments = Vec::new();

    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .file_name()
            .map(base_name)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| IngestError::MissingFileName(field_name.clone()))?;

        let mut file = workspace.create_file(&file_name).await?;
        let write_err = |source| IngestError::Write {
            name: file_name.clone(),
            source,
        };

        let mut size = 0usize;
        while let Some(chunk) = field.chunk().await? {
            file.write_all(&chunk).await.map_err(write_err)?;
            size += chunk.len();
        }
        file.flush().await.map_err(write_err)?;

        let kind = PartKind::classify(&field_name);
        tracing::debug!(
            field = %field_name,
            file_name = %file_name,
            size = size,
            kind = ?kind,
            "Part saved"
        );

        match kind {
            PartKind::Html => html = Some(file_name),
            PartKind::Css => css = Some(file_name),
            PartKind::Attachment => attachments.push(file_name),
            PartKind::Asset => {}
        }
    }

    let html = html.ok_or(IngestError::MissingHtml)?;

    Ok(PartSet {
        html,
        css: css.unwrap_or_else(|| default_stylesheet.to_string()),
        attachments,
    })
}

/// Final path component of a client-declared file name
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
