//! Request middleware
//!
//! Bearer authentication for the render endpoint and per-request spans.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Span;
use uuid::Uuid;

use crate::auth::parse_bearer_token;
use crate::error::AppError;
use crate::state::AppState;

/// Reject the request unless it carries a valid bearer token.
///
/// On success the verified [`crate::auth::AccessClaims`] are added to the
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = parse_bearer_token(header)?;
    let claims = state.validator().validate(token)?;

    tracing::debug!(
        subject = claims.subject.as_deref().unwrap_or("-"),
        "Request authenticated"
    );
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Span for `TraceLayer`, tagged with a fresh request id
pub fn request_span(req: &axum::http::Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %Uuid::new_v4(),
    )
}
