//! # Order Status State Machine
//!
//! Models the delivery lifecycle of a placed order.
//!
//! ## States
//!
//! ```text
//! Pending (0) ──▶ Delivered (1)
//! ```
//!
//! Two states, ordinal-encoded in storage. The interesting part is not
//! the graph but who may move along it:
//!
//! - The **single-field partial update** (Manager or DeliveryCrew) may
//!   only advance `Pending → Delivered`; same-state writes are accepted
//!   as no-ops, and winding a delivered order back is rejected.
//! - The **full replace** (Manager) sets the status directly and is not
//!   routed through [`OrderStatus::patch_transition`] — the replace
//!   deliberately bypasses the single-field restriction.
//! - The customer has no transition rights at all after creation.
//!
//! ## Design Decision
//!
//! An enum with a validated `patch_transition()` returning `Result`
//! rather than typestate: with two states and one edge, type-level
//! encoding would add two zero-sized types without proportional safety
//! benefit. Invalid moves are rejected at runtime with a structured
//! error naming both endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Delivery status of a placed order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum OrderStatus {
    /// Placed, not yet delivered.
    Pending = 0,
    /// Delivered to the customer (terminal for the partial-update path).
    Delivered = 1,
}

impl OrderStatus {
    /// Ordinal encoding used in storage.
    pub fn as_i16(&self) -> i16 {
        *self as i16
    }

    /// Decode the storage ordinal.
    pub fn from_i16(value: i16) -> Option<OrderStatus> {
        match value {
            0 => Some(OrderStatus::Pending),
            1 => Some(OrderStatus::Delivered),
            _ => None,
        }
    }

    /// Validate a status change requested through the single-field
    /// partial update.
    ///
    /// Same-state writes succeed as no-ops. The only real move is
    /// `Pending → Delivered`; anything else is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::InvalidTransition`] for `Delivered →
    /// Pending`.
    pub fn patch_transition(self, to: OrderStatus) -> Result<OrderStatus, StatusError> {
        match (self, to) {
            (from, to) if from == to => Ok(to),
            (OrderStatus::Pending, OrderStatus::Delivered) => Ok(to),
            (from, to) => Err(StatusError::InvalidTransition { from, to }),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Delivered => "DELIVERED",
        };
        f.write_str(s)
    }
}

/// Errors raised by status transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// The requested move is not legal through the partial-update path.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Attempted target status.
        to: OrderStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_roundtrip() {
        assert_eq!(OrderStatus::Pending.as_i16(), 0);
        assert_eq!(OrderStatus::Delivered.as_i16(), 1);
        assert_eq!(OrderStatus::from_i16(0), Some(OrderStatus::Pending));
        assert_eq!(OrderStatus::from_i16(1), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::from_i16(7), None);
    }

    #[test]
    fn pending_to_delivered_is_legal() {
        assert_eq!(
            OrderStatus::Pending.patch_transition(OrderStatus::Delivered),
            Ok(OrderStatus::Delivered)
        );
    }

    #[test]
    fn same_state_write_is_a_noop() {
        assert!(OrderStatus::Pending
            .patch_transition(OrderStatus::Pending)
            .is_ok());
        assert!(OrderStatus::Delivered
            .patch_transition(OrderStatus::Delivered)
            .is_ok());
    }

    #[test]
    fn delivered_cannot_return_to_pending() {
        let err = OrderStatus::Delivered
            .patch_transition(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(
            err,
            StatusError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending,
            }
        );
    }

    #[test]
    fn statuses_are_ordered() {
        assert!(OrderStatus::Pending < OrderStatus::Delivered);
    }

    #[test]
    fn wire_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"delivered\"").unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn display_is_screaming_snake() {
        assert_eq!(OrderStatus::Pending.to_string(), "PENDING");
        assert_eq!(OrderStatus::Delivered.to_string(), "DELIVERED");
    }
}
