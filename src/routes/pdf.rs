//! Render endpoint
//!
//! Accepts a multipart upload on any path and answers with the rendered PDF.
//! Bearer auth runs first as middleware; the handler then validates the
//! request, ingests the parts into a fresh workspace and streams the
//! renderer's output back.

use std::io;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::{future, stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tracing::Instrument;

use crate::auth::AccessClaims;
use crate::error::{AppError, Result};
use crate::ingest::{ingest_parts, Workspace};
use crate::render::{RenderError, RenderRequest, SANDBOX_DEFAULT_STYLESHEET};
use crate::state::AppState;

pub const MULTIPART_REQUIRED_MESSAGE: &str = "Multipart request required.";
pub const CONTENT_DISPOSITION: &str = "attachment; filename=\"output.pdf\"";

/// Renderer output buffered between the render task and the response body
const OUTPUT_BUFFER_BYTES: usize = 64 * 1024;

// ============================================================================
// Handler
// ============================================================================

/// POST /pdf (and any other path)
///
/// Headers are committed once the renderer produces its first bytes. A render
/// that fails before that gets a normal error response; one that fails later
/// can only cut the body short.
pub async fn render_pdf(State(state): State<AppState>, request: Request) -> Result<Response> {
    if request.method() != Method::POST {
        return Err(AppError::method_not_allowed());
    }
    require_multipart(request.headers())?;
    check_declared_length(request.headers(), state.limits().max_request_bytes)?;

    let subject = request
        .extensions()
        .get::<AccessClaims>()
        .and_then(|claims| claims.subject.clone());

    let workspace = Workspace::create(state.limits().workspace_dir.as_deref())
        .map_err(|err| AppError::internal("Failed to create workspace").with_cause(err))?;

    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|err| AppError::bad_request(MULTIPART_REQUIRED_MESSAGE).with_cause(err))?;

    let parts = tokio::time::timeout(
        state.limits().ingest_timeout,
        ingest_parts(&mut multipart, &workspace, SANDBOX_DEFAULT_STYLESHEET),
    )
    .await
    .map_err(|elapsed| AppError::internal("Ingestion deadline exceeded").with_cause(elapsed))??;

    tracing::info!(
        subject = subject.as_deref().unwrap_or("-"),
        html = %parts.html,
        css = %parts.css,
        attachments = parts.attachments.len(),
        "Rendering PDF"
    );

    // The render timeout starts only once the upload is on disk
    let render_request = RenderRequest::new(
        workspace.path().to_path_buf(),
        parts,
        state.limits().request_timeout,
    );
    let (reader, task) = spawn_render(&state, render_request, workspace);

    let mut output = ReaderStream::new(reader);
    match output.next().await {
        Some(Ok(first)) => {
            let tail = stream::once(task.finish_streaming()).filter_map(future::ready);
            let body = stream::once(future::ready(Ok::<_, io::Error>(first)))
                .chain(output)
                .chain(tail);
            Ok(pdf_response(Body::from_stream(body)))
        }
        Some(Err(err)) => {
            Err(AppError::internal("Failed to read renderer output").with_cause(err))
        }
        None => {
            task.finish().await?;
            Ok(pdf_response(Body::empty()))
        }
    }
}

// ============================================================================
// Render task
// ============================================================================

/// Run the renderer on its own task, writing into an in-memory pipe.
///
/// The task owns the workspace and removes it before closing the pipe, so the
/// directory is gone by the time the body ends.
fn spawn_render(
    state: &AppState,
    request: RenderRequest,
    workspace: Workspace,
) -> (tokio::io::DuplexStream, RenderTask) {
    let (reader, mut writer) = tokio::io::duplex(OUTPUT_BUFFER_BYTES);
    let renderer = state.renderer();

    let handle = tokio::spawn(
        async move {
            let result = renderer.render(&request, &mut writer).await;
            if let Err(err) = workspace.close() {
                tracing::warn!(error = %err, "Failed to remove workspace");
            }
            drop(writer);
            result
        }
        .in_current_span(),
    );

    (reader, RenderTask(handle))
}

/// Handle to a running render. Dropping it aborts the render, which kills the
/// subprocess and removes the workspace.
struct RenderTask(JoinHandle<std::result::Result<(), RenderError>>);

impl RenderTask {
    async fn finish(mut self) -> Result<()> {
        match (&mut self.0).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(err) => Err(AppError::internal("Render task failed").with_cause(err)),
        }
    }

    /// Headers are already sent; a failure can only end the stream early
    async fn finish_streaming(self) -> Option<io::Result<Bytes>> {
        match self.finish().await {
            Ok(()) => None,
            Err(err) => {
                tracing::error!(error = %err.diagnostic(), "PDF stream aborted");
                Some(Err(io::Error::other(err.to_string())))
            }
        }
    }
}

impl Drop for RenderTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Content type must parse as `multipart/form-data`
fn require_multipart(headers: &HeaderMap) -> Result<()> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match content_type.parse::<mime::Mime>() {
        Ok(parsed) if parsed.essence_str() == mime::MULTIPART_FORM_DATA.essence_str() => Ok(()),
        Ok(_) => Err(AppError::bad_request(MULTIPART_REQUIRED_MESSAGE)),
        Err(err) => Err(AppError::bad_request(MULTIPART_REQUIRED_MESSAGE).with_cause(err)),
    }
}

/// Reject a declared Content-Length over the limit before any body is read.
/// Undeclared or chunked bodies are caught by the body limit while ingesting.
fn check_declared_length(headers: &HeaderMap, max_bytes: u64) -> Result<()> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    match declared {
        Some(length) if length > max_bytes => {
            Err(AppError::request_too_large("Request body too large."))
        }
        _ => Ok(()),
    }
}

fn pdf_response(body: Body) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static(CONTENT_DISPOSITION),
            ),
        ],
        body,
    )
        .into_response()
}
