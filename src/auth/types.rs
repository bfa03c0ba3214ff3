//! Auth types

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::AppError;

/// Verified claim set of one bearer token. Lives for a single request.
#[derive(Debug, Clone)]
pub struct AccessClaims {
    pub issuer: String,
    pub subject: Option<String>,
    pub scope: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Why a request could not be authorized
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization")]
    MissingAuthorization,

    #[error("invalid authorization scheme")]
    InvalidScheme,

    #[error("missing token")]
    MissingToken,

    #[error("token verification failed: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),

    #[error("token verification failed: no signing key for kid {0:?}")]
    UnknownKey(Option<String>),

    #[error("token verification failed: algorithm {0:?} not accepted")]
    UnsupportedAlgorithm(jsonwebtoken::Algorithm),

    #[error("token claims validation failed: issuer mismatch (expected {expected}, got {actual:?})")]
    IssuerMismatch {
        expected: String,
        actual: Option<String>,
    },

    #[error("forbidden: required scope {0:?} missing")]
    MissingScope(String),
}

impl AuthError {
    /// Authenticated, but not allowed to do this
    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthError::MissingScope(_))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if err.is_forbidden() {
            AppError::forbidden("Forbidden").with_cause(err)
        } else {
            AppError::unauthorized("Unauthorized").with_cause(err)
        }
    }
}

/// Failure to build a validator at startup
#[derive(Debug, Error)]
pub enum AuthInitError {
    #[error("{0} is required")]
    MissingSetting(&'static str),

    #[error("failed to fetch jwks: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("jwks is empty")]
    EmptyKeySet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_scope_failure_maps_to_forbidden() {
        let err: AppError = AuthError::MissingScope("pdf#create".into()).into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_other_failures_map_to_unauthorized() {
        for err in [
            AuthError::MissingAuthorization,
            AuthError::InvalidScheme,
            AuthError::UnknownKey(Some("k".into())),
            AuthError::IssuerMismatch {
                expected: "https://a".into(),
                actual: Some("https://b".into()),
            },
        ] {
            let app: AppError = err.into();
            assert_eq!(app.status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
