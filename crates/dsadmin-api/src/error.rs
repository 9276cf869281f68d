//! # API Error Type
//!
//! Maps core domain errors to HTTP status codes and a structured JSON
//! error body. User-correctable failures (duplicate id, missing dataset,
//! malformed input) are 400; credential failures are 403; everything
//! internal — lock contention, I/O, parse failures of the stores — is a
//! 500 whose detail is logged but never returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dsadmin_core::{CatalogError, KeyError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "BAD_REQUEST", "FORBIDDEN").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error implementing [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// A user-correctable request failure (400).
    #[error("{0}")]
    BadRequest(String),

    /// Authentication failure (403). The message is always the same
    /// regardless of which credential check failed.
    #[error("invalid API key")]
    Forbidden,

    /// Internal failure (500). Detail is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error detail to clients.
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::DuplicateId(_)
            | CatalogError::NotFound(_)
            | CatalogError::Validation(_) => Self::BadRequest(err.to_string()),
            CatalogError::Lock(_) | CatalogError::Io(_) | CatalogError::Xml(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<KeyError> for AppError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::Unauthenticated => Self::Forbidden,
            KeyError::InvalidName(_)
            | KeyError::DuplicateName(_)
            | KeyError::NotFound(_)
            | KeyError::InvalidExpiry(_) => Self::BadRequest(err.to_string()),
            KeyError::Lock(_) | KeyError::Io(_) | KeyError::Csv(_) | KeyError::Timestamp(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
