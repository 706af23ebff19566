//! # Error Types — Shared Validation Errors
//!
//! Validation failures raised by the constructors in this crate. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations. Higher layers map these onto caller-visible error
//! responses; the messages here carry the offending value so operators
//! can see exactly what was rejected.

use thiserror::Error;

/// Validation failure for a domain-primitive value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty, too long, or contains forbidden characters.
    #[error("invalid username: {0:?}")]
    InvalidUsername(String),

    /// Price must be strictly positive.
    #[error("price must be greater than zero, got {0}")]
    NonPositivePrice(String),

    /// Quantity must be a positive integer.
    #[error("quantity must be a positive integer, got {0}")]
    NonPositiveQuantity(i32),

    /// Category slug is empty or not URL-safe.
    #[error("invalid category slug: {0:?}")]
    InvalidSlug(String),

    /// A required title field is empty or exceeds the length limit.
    #[error("invalid title: {0}")]
    InvalidTitle(String),
}
