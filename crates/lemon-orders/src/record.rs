//! # Order Records
//!
//! A placed order and its immutable item snapshots. Records are created
//! only by the conversion engine ([`crate::convert`]); after creation
//! the only mutable fields are `delivery_crew` and `status`, and the
//! item list and `total` are never recomputed.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use lemon_core::{MenuItemId, OrderId, OrderItemId, UserId};

use crate::status::OrderStatus;

/// An immutable historical snapshot of one converted cart line.
///
/// Never recomputed from the live menu price after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemRecord {
    /// Unique snapshot identifier.
    pub id: OrderItemId,
    /// The order this snapshot belongs to.
    pub order_id: OrderId,
    /// The menu item that was ordered.
    pub menu_item_id: MenuItemId,
    /// Quantity carried over from the cart line.
    pub quantity: i32,
    /// Unit price snapshot carried over from the cart line.
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    /// Line total snapshot carried over from the cart line.
    #[schema(value_type = String)]
    pub line_price: Decimal,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderRecord {
    /// Unique order identifier.
    pub id: OrderId,
    /// The customer who placed the order.
    pub user_id: UserId,
    /// Assigned delivery-crew member, if any.
    pub delivery_crew: Option<UserId>,
    /// Delivery status.
    pub status: OrderStatus,
    /// Sum of the items' line prices, fixed at creation.
    #[schema(value_type = String)]
    pub total: Decimal,
    /// Calendar date the order was placed.
    pub placed_on: NaiveDate,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Immutable item snapshots, one per converted cart line.
    pub items: Vec<OrderItemRecord>,
}

impl OrderRecord {
    /// Verify the creation-time invariant `total == Σ items.line_price`.
    ///
    /// Used by tests and by hydration sanity checks; the conversion
    /// engine constructs records that satisfy it by construction.
    pub fn total_matches_items(&self) -> bool {
        self.total == self.items.iter().map(|i| i.line_price).sum::<Decimal>()
    }
}
