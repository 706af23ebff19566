//! # Request Validation
//!
//! Handlers take `body: Result<Json<T>, JsonRejection>` and route it
//! through [`extract_validated_json`], so malformed JSON and
//! business-rule violations both surface as structured 400 responses
//! instead of axum's default plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request types that carry field-level validation rules.
pub trait Validate {
    /// Check the request's fields, returning a human-readable reason on
    /// failure.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON extraction result and run the payload's validation.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] for both deserialization
/// rejections and validation failures.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    value.validate().map_err(AppError::InvalidInput)?;
    Ok(value)
}
