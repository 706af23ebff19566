//! # Cart Lines
//!
//! A cart line is a pending, unconfirmed order line owned by one
//! customer and referencing one menu item. The menu price is snapshotted
//! into the line at creation; later catalog price changes never touch an
//! existing line.
//!
//! Uniqueness invariant: at most one line per (customer, menu item) pair
//! at any time. The store enforces it under its write lock and the
//! database duplicates it as a UNIQUE constraint; both surface as
//! [`CartError::DuplicateItem`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use lemon_core::{line_total, validate_quantity, CartLineId, MenuItemId, UserId, ValidationError};

/// A pending cart line with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    /// Unique line identifier.
    pub id: CartLineId,
    /// The customer owning this line.
    pub user_id: UserId,
    /// The referenced menu item.
    pub menu_item_id: MenuItemId,
    /// Requested quantity, always ≥ 1.
    pub quantity: i32,
    /// Menu price at the moment the line was added. Fixed thereafter.
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    /// `unit_price × quantity`, computed once at creation.
    #[schema(value_type = String)]
    pub line_price: Decimal,
    /// When the line was added.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Create a line, validating the quantity and snapshotting
    /// `unit_price` into an exact line total.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity < 1`.
    pub fn new(
        user_id: UserId,
        menu_item_id: MenuItemId,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<Self, CartError> {
        let quantity = validate_quantity(quantity)?;
        Ok(Self {
            id: CartLineId::new(),
            user_id,
            menu_item_id,
            quantity,
            unit_price,
            line_price: line_total(unit_price, quantity),
            added_at: Utc::now(),
        })
    }
}

/// Errors raised by cart ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A line for this (customer, menu item) pair already exists.
    #[error("menu item {menu_item_id} is already in the cart")]
    DuplicateItem {
        /// The item that was added twice.
        menu_item_id: MenuItemId,
    },

    /// The requested quantity is not a positive integer.
    #[error(transparent)]
    InvalidQuantity(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_snapshots_price_and_computes_total() {
        let line = CartLine::new(UserId::new(), MenuItemId::new(), 2, dec!(12.50)).unwrap();
        assert_eq!(line.unit_price, dec!(12.50));
        assert_eq!(line.line_price, dec!(25.00));
    }

    #[test]
    fn quantity_must_be_positive() {
        let user = UserId::new();
        let item = MenuItemId::new();
        assert!(CartLine::new(user, item, 0, dec!(5.00)).is_err());
        assert!(CartLine::new(user, item, -1, dec!(5.00)).is_err());
    }

    #[test]
    fn quantity_one_is_the_floor() {
        let line = CartLine::new(UserId::new(), MenuItemId::new(), 1, dec!(5.00)).unwrap();
        assert_eq!(line.line_price, dec!(5.00));
    }

    #[test]
    fn duplicate_error_names_the_item() {
        let item = MenuItemId::new();
        let err = CartError::DuplicateItem { menu_item_id: item };
        assert!(err.to_string().contains(&item.to_string()));
    }
}
