//! Sandboxed weasyprint renderer
//!
//! Runs weasyprint under bubblewrap. Stdout is copied to the caller as it is
//! produced; stderr is kept (bounded) for diagnostics.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use super::invocation::SandboxInvocation;
use super::types::{PdfRenderer, RenderError, RenderRequest};
use crate::config::SandboxConfig;

/// Stderr beyond this is drained and discarded
const MAX_STDERR_BYTES: usize = 64 * 1024;

pub struct SandboxRenderer {
    config: SandboxConfig,
}

impl SandboxRenderer {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn invocation(&self, request: &RenderRequest) -> SandboxInvocation {
        SandboxInvocation::build(&self.config, request)
    }
}

#[async_trait]
impl PdfRenderer for SandboxRenderer {
    async fn render(
        &self,
        request: &RenderRequest,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), RenderError> {
        let invocation = self.invocation(request);

        let mut child = Command::new(&invocation.launcher)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: invocation.launcher.display().to_string(),
                source,
            })?;

        tracing::debug!(
            pid = child.id(),
            html = %request.html,
            attachments = request.attachments.len(),
            "Renderer started"
        );

        let stderr = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(capture_bounded(stderr, MAX_STDERR_BYTES)));
        let mut stdout = child.stdout.take();

        let run = async {
            if let Some(stdout) = stdout.as_mut() {
                tokio::io::copy(stdout, &mut *output)
                    .await
                    .map_err(RenderError::Output)?;
                output.flush().await.map_err(RenderError::Output)?;
            }
            child.wait().await.map_err(RenderError::Wait)
        };

        let result = tokio::time::timeout_at(request.deadline, run).await;
        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => {
                let _ = child.kill().await;
                return Err(err);
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(RenderError::Timeout);
            }
        };

        if status.success() {
            tracing::debug!("Renderer finished");
            return Ok(());
        }

        let stderr = match stderr {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        Err(RenderError::Failed { status, stderr })
    }
}

/// Read everything, keep at most `limit` bytes
async fn capture_bounded<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> String {
    let mut kept = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = limit.saturating_sub(kept.len());
                kept.extend_from_slice(&buf[..n.min(room)]);
            }
        }
    }
    String::from_utf8_lossy(&kept).trim().to_string()
}
