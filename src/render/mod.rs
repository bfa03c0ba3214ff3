//! PDF rendering
//!
//! [`SandboxInvocation`] describes what the sandbox exposes;
//! [`SandboxRenderer`] runs it and streams the PDF out.

mod invocation;
mod sandbox;
mod types;

pub use invocation::{
    IsolationArg, SandboxInvocation, SANDBOX_DEFAULT_STYLESHEET, SANDBOX_PATH, SANDBOX_WORKSPACE,
};
pub use sandbox::SandboxRenderer;
pub use types::{PdfRenderer, RenderError, RenderRequest};
