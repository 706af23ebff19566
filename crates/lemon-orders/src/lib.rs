//! # lemon-orders — Cart Ledger and Order Lifecycle
//!
//! The order-domain half of the Lemon Stack. Everything here is pure:
//! persistence and request handling live in `lemon-api`, which drives
//! these types through its stores and its database transaction.
//!
//! ## Modules
//!
//! - [`cart`]: pending cart lines. A line snapshots the menu price at
//!   creation and is never updated in place — a duplicate add for the
//!   same (customer, menu item) pair is rejected, not merged.
//! - [`status`]: the order status state machine (`Pending → Delivered`)
//!   with the single-field-update transition gate.
//! - [`record`]: placed orders and their immutable item snapshots.
//! - [`convert`]: the aggregation step of order conversion — cart lines
//!   in, an order draft with exact decimal total out.

pub mod cart;
pub mod convert;
pub mod record;
pub mod status;

pub use cart::{CartError, CartLine};
pub use convert::{build_order, ConvertError};
pub use record::{OrderItemRecord, OrderRecord};
pub use status::{OrderStatus, StatusError};
