//! Request ingestion
//!
//! Field name conventions:
//! - `html`: the document to render (required; the last one wins)
//! - `css`: stylesheet (optional; the sandbox default is used otherwise)
//! - `attachment.*` / `file.*`: embedded as PDF attachments, in stream order
//! - anything else: saved next to the HTML so it can be referenced
//!
//! Every part must be a file upload. A plain form field (no file name) is
//! refused with a 400 rather than saved.

mod ingestor;
mod types;
mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use ingestor::ingest_parts;
pub use types::{IngestError, PartKind, PartSet, MISSING_HTML_MESSAGE};
pub use workspace::{Workspace, WorkspaceError};
