//! PDF Service
//!
//! Authenticated HTML to PDF rendering. Callers POST a multipart form holding
//! an HTML document plus optional stylesheet, attachments and assets; the
//! service renders it with weasyprint inside a bubblewrap sandbox and streams
//! the PDF back.
//!
//! # Modules
//!
//! - `auth`: bearer token parsing and OIDC access token validation
//! - `ingest`: multipart ingestion into a per-request workspace
//! - `render`: sandbox invocation and the subprocess renderer
//! - `routes`: the HTTP surface tying the stages together

pub mod auth;
pub mod config;
pub mod error;
pub mod ingest;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod state;
