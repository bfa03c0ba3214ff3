//! Error types for the PDF service
//!
//! Every component returns its own error enum; each converts into exactly one
//! [`AppError`] variant, which owns the HTTP status and the caller-facing text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Boxed cause kept for diagnostics only
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message returned for every internal failure
pub const INTERNAL_MESSAGE: &str = "Failed to process request.";

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    BadRequest {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("{message}")]
    Unauthorized {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("{message}")]
    Forbidden {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("{message}")]
    MethodNotAllowed { message: String },

    #[error("{message}")]
    RequestTooLarge {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            cause: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            message: message.into(),
            cause: None,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden {
            message: message.into(),
            cause: None,
        }
    }

    pub fn method_not_allowed() -> Self {
        AppError::MethodNotAllowed {
            message: "Method not allowed".to_string(),
        }
    }

    pub fn request_too_large(message: impl Into<String>) -> Self {
        AppError::RequestTooLarge {
            message: message.into(),
            cause: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a diagnostic cause. Never shown to the caller.
    pub fn with_cause(mut self, err: impl Into<BoxError>) -> Self {
        let err = Some(err.into());
        match &mut self {
            AppError::BadRequest { cause, .. }
            | AppError::Unauthorized { cause, .. }
            | AppError::Forbidden { cause, .. }
            | AppError::RequestTooLarge { cause, .. }
            | AppError::Internal { cause, .. } => *cause = err,
            AppError::MethodNotAllowed { .. } => {}
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the caller
    pub fn public_message(&self) -> &str {
        match self {
            AppError::Internal { .. } => INTERNAL_MESSAGE,
            AppError::BadRequest { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::MethodNotAllowed { message }
            | AppError::RequestTooLarge { message, .. } => message,
        }
    }

    /// Full cause chain for logs
    pub fn diagnostic(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let cause = self.diagnostic();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), cause = %cause, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), cause = %cause, "request failed");
        }

        (status, self.public_message().to_string()).into_response()
    }
}
