//! # API Route Modules
//!
//! Route modules for the Lemon Stack API surface:
//!
//! - `menu` — catalog reads for everyone, writes gated by the
//!   menu-write exclusion rule (categories included).
//! - `cart` — the customer's cart ledger: list, add with duplicate
//!   rejection and price snapshotting, idempotent clear.
//! - `orders` — role-filtered listing, cart-to-order conversion, and
//!   the role-gated single-order lifecycle (read / replace /
//!   status-only patch / delete).
//! - `groups` — Manager-administered role-group membership for the
//!   manager, delivery-crew, and customer groups.
//!
//! Handlers perform authorization through `lemon_auth::authorize`
//! before touching any store; serialization concerns stay in the
//! request/response types defined next to each handler.

pub mod cart;
pub mod groups;
pub mod menu;
pub mod orders;
