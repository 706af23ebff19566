//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from lemon-auth and lemon-orders to HTTP status
//! codes and JSON error bodies with a machine-readable code. Never
//! exposes internal error details in responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use lemon_auth::PolicyError;
use lemon_core::ValidationError;
use lemon_orders::{CartError, ConvertError, StatusError};

/// Structured JSON error response body.
///
/// All error responses use this format for consistency across the API
/// surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "EMPTY_CART").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
///
/// The variants are the caller-visible error taxonomy: every denial or
/// validation failure is detected before any mutation, and internal
/// failures never leak their message to the client.
#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced resource id does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or missing input — bad quantity, multi-field status
    /// patch, unknown references (400).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Cart add for an item already present (400).
    #[error("duplicate item: {0}")]
    DuplicateItem(String),

    /// Order placement attempted with no cart lines (400).
    #[error("cannot place an order from an empty cart")]
    EmptyCart,

    /// No held role is entitled to the action (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Role-eligible in general but not for this resource (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal failure (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            Self::DuplicateItem(_) => (StatusCode::BAD_REQUEST, "DUPLICATE_ITEM"),
            Self::EmptyCart => (StatusCode::BAD_REQUEST, "EMPTY_CART"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        // Log server-side errors for operator visibility.
        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Policy denials carry their caller-visible class per action.
impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        match &err {
            PolicyError::Unauthorized { .. } => Self::Unauthorized(err.to_string()),
            PolicyError::Forbidden { .. } => Self::Forbidden(err.to_string()),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match &err {
            CartError::DuplicateItem { .. } => Self::DuplicateItem(err.to_string()),
            CartError::InvalidQuantity(_) => Self::InvalidInput(err.to_string()),
        }
    }
}

impl From<ConvertError> for AppError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::EmptyCart => Self::EmptyCart,
        }
    }
}

/// Illegal status moves are input errors on the patch path.
impl From<StatusError> for AppError {
    fn from(err: StatusError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Database failures: a unique-constraint conflict is the authoritative
/// duplicate-item signal; everything else is internal.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::DuplicateItem("item is already in the cart".to_string());
            }
        }
        Self::Internal(err.to_string())
    }
}
