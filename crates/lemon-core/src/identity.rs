//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the Lemon Stack.
//! Each identifier is a distinct type — you cannot pass a [`UserId`]
//! where an [`OrderId`] is expected.
//!
//! ## Validation
//!
//! The string-based [`Username`] validates format at construction time.
//! UUID-based identifiers ([`UserId`], [`CategoryId`], [`MenuItemId`],
//! [`CartLineId`], [`OrderId`]) are always valid by construction.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ValidationError;

/// Helper macro for UUID-backed identifier newtypes. Generates the
/// constructor set, `Display`, `FromStr`, and `From<Uuid>` so every
/// identifier behaves identically at the seams.
macro_rules! uuid_identifier {
    ($(#[$doc:meta])* $ty:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $ty(Uuid);

        impl $ty {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self)
            }
        }
    };
}

uuid_identifier! {
    /// A unique identifier for a principal (customer, delivery crew
    /// member, or manager) known to the service.
    UserId
}

uuid_identifier! {
    /// A unique identifier for a menu category.
    CategoryId
}

uuid_identifier! {
    /// A unique identifier for a menu item in the catalog.
    MenuItemId
}

uuid_identifier! {
    /// A unique identifier for a pending cart line.
    CartLineId
}

uuid_identifier! {
    /// A unique identifier for a placed order.
    OrderId
}

uuid_identifier! {
    /// A unique identifier for an immutable order-item snapshot.
    OrderItemId
}

// ---------------------------------------------------------------------------
// Username (validated at construction)
// ---------------------------------------------------------------------------

/// A principal's username as forwarded by the authentication gateway.
///
/// # Validation
///
/// - 1 to 150 characters
/// - ASCII letters, digits, and `@ . + - _` only
///
/// The character set matches what the upstream identity provider issues;
/// anything else is rejected at construction and at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Create a username from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUsername`] if the string is
    /// empty, longer than 150 characters, or contains characters outside
    /// the allowed set.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() || s.len() > 150 {
            return Err(ValidationError::InvalidUsername(s));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(ValidationError::InvalidUsername(s));
        }
        Ok(Self(s))
    }

    /// Access the username string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
