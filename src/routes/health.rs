//! Liveness probe

/// GET /healthcheck
pub async fn healthcheck() -> &'static str {
    "OK"
}
