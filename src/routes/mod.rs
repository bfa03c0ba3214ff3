//! Route modules for the PDF service

pub mod health;
pub mod pdf;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::{request_span, require_auth};
use crate::state::AppState;

/// Build the service router.
///
/// `/healthcheck` is public. Every other path renders, behind bearer auth.
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.limits().max_request_bytes).unwrap_or(usize::MAX);

    let render = Router::new()
        .route("/pdf", any(pdf::render_pdf))
        .fallback(pdf::render_pdf)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .merge(render)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}
