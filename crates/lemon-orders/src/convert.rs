//! # Order Conversion — Aggregation Step
//!
//! The pure half of the cart-to-order conversion engine: given the
//! customer's cart lines, build the order record and its item
//! snapshots. The transactional half (persist order + items, delete the
//! consumed lines, commit-or-rollback) lives in the API crate's
//! database layer; this function never does I/O.
//!
//! Every cart line yields exactly one item snapshot — no loss, no
//! duplication — and the order total is the exact decimal sum of the
//! line prices.

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use lemon_core::{OrderId, OrderItemId, UserId};

use crate::cart::CartLine;
use crate::record::{OrderItemRecord, OrderRecord};
use crate::status::OrderStatus;

/// Errors raised by the aggregation step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Conversion was attempted with no cart lines.
    #[error("cannot place an order from an empty cart")]
    EmptyCart,
}

/// Aggregate `lines` into a new pending order for `customer`.
///
/// The order starts `Pending` with no delivery crew, dated today (UTC).
/// Lines are snapshotted in the order given; creation order carries no
/// meaning.
///
/// # Errors
///
/// Returns [`ConvertError::EmptyCart`] when `lines` is empty; nothing
/// is allocated in that case.
pub fn build_order(customer: UserId, lines: &[CartLine]) -> Result<OrderRecord, ConvertError> {
    if lines.is_empty() {
        return Err(ConvertError::EmptyCart);
    }

    let order_id = OrderId::new();
    let total: Decimal = lines.iter().map(|l| l.line_price).sum();
    let items = lines
        .iter()
        .map(|line| OrderItemRecord {
            id: OrderItemId::new(),
            order_id,
            menu_item_id: line.menu_item_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_price: line.line_price,
        })
        .collect();

    let now = Utc::now();
    Ok(OrderRecord {
        id: order_id,
        user_id: customer,
        delivery_crew: None,
        status: OrderStatus::Pending,
        total,
        placed_on: now.date_naive(),
        created_at: now,
        items,
    })
}
